//! Terminal payload and the three signal kinds.
//!
//! The "no payload" marker used across the crate is Rust's unit type `()`.

use crate::error::RxError;

/// Payload of the terminal signal: the stream ended either successfully or
/// with a failure.
#[derive(Debug, Clone, Default)]
pub enum Completion {
  #[default]
  Success,
  Failure(RxError),
}

impl Completion {
  #[inline]
  pub fn failure(err: RxError) -> Self { Completion::Failure(err) }

  #[inline]
  pub fn is_success(&self) -> bool { matches!(self, Completion::Success) }

  #[inline]
  pub fn is_failure(&self) -> bool { matches!(self, Completion::Failure(_)) }

  /// The failure, if any.
  pub fn error(&self) -> Option<&RxError> {
    match self {
      Completion::Success => None,
      Completion::Failure(err) => Some(err),
    }
  }

  /// Converts into a std `Result`.
  pub fn into_result(self) -> Result<(), RxError> {
    match self {
      Completion::Success => Ok(()),
      Completion::Failure(err) => Err(err),
    }
  }
}

impl From<Result<(), RxError>> for Completion {
  fn from(result: Result<(), RxError>) -> Self {
    match result {
      Ok(()) => Completion::Success,
      Err(err) => Completion::Failure(err),
    }
  }
}

/// One signal delivered from a producer to an observer.
#[derive(Debug, Clone)]
pub enum Notification<T> {
  Next(T),
  /// Non-terminal failure; delivery continues.
  ErrorResume(RxError),
  /// Terminal signal, at most one per subscription.
  Completed(Completion),
}

impl<T> Notification<T> {
  pub fn is_terminal(&self) -> bool { matches!(self, Notification::Completed(_)) }

  /// The value carried by a `Next` signal.
  pub fn value(&self) -> Option<&T> {
    match self {
      Notification::Next(v) => Some(v),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxpush_macro::test]
  fn completion_round_trips_through_result() {
    let ok: Completion = Ok(()).into();
    assert!(ok.is_success());
    assert!(ok.error().is_none());

    let failed = Completion::failure(RxError::msg("bad"));
    assert!(failed.is_failure());
    assert_eq!(failed.error().map(ToString::to_string).as_deref(), Some("bad"));
    assert!(failed.into_result().is_err());
  }

  #[rxpush_macro::test]
  fn only_completed_is_terminal() {
    assert!(!Notification::Next(1).is_terminal());
    assert!(!Notification::<i32>::ErrorResume(RxError::Timeout).is_terminal());
    assert!(Notification::<i32>::Completed(Completion::Success).is_terminal());
    assert_eq!(Notification::Next(3).value(), Some(&3));
  }
}
