//! Error type shared by every signal and every fallible call in the crate.
//!
//! Errors travel through two channels: the resumable `on_error_resume`
//! signal and the terminal [`Completion::Failure`](crate::Completion). Both
//! fan a single failure out to many observers, so [`RxError`] is cheap to
//! clone: every payload is reference counted.

use std::{any::Any, error::Error as StdError, fmt, sync::Arc};

/// Errors produced or carried by the runtime.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RxError {
  /// A handle was used after it was disposed.
  #[error("object already disposed")]
  AlreadyDisposed,

  /// A single-assignment handle received a second resource.
  #[error("disposable already assigned")]
  AlreadyAssigned,

  /// A callback panicked; the payload message is preserved when it was a
  /// string.
  #[error("callback panicked: {0}")]
  Panicked(Arc<str>),

  /// A time-bounded operation did not finish in time.
  #[error("operation timed out")]
  Timeout,

  /// A plain message error.
  #[error("{0}")]
  Message(Arc<str>),

  /// Any other error, shared so it can be delivered to several observers.
  #[error(transparent)]
  Custom(Arc<dyn StdError + Send + Sync + 'static>),
}

impl RxError {
  /// Builds a [`RxError::Message`].
  pub fn msg(message: impl fmt::Display) -> Self { RxError::Message(message.to_string().into()) }

  /// Wraps an arbitrary error.
  pub fn custom<E>(err: E) -> Self
  where
    E: StdError + Send + Sync + 'static,
  {
    RxError::Custom(Arc::new(err))
  }

  /// Converts a panic payload caught by `catch_unwind`.
  pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
    let message: Arc<str> = if let Some(s) = payload.downcast_ref::<&'static str>() {
      (*s).into()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.as_str().into()
    } else {
      "non-string panic payload".into()
    };
    RxError::Panicked(message)
  }

  /// Returns `true` for [`RxError::AlreadyDisposed`].
  pub fn is_disposed(&self) -> bool { matches!(self, RxError::AlreadyDisposed) }
}

#[cfg(test)]
mod tests {
  use std::panic;

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("io went wrong")]
  struct IoLike;

  #[rxpush_macro::test]
  fn panic_payload_message_is_kept() {
    let caught = panic::catch_unwind(|| panic!("boom {}", 42)).unwrap_err();
    let err = RxError::from_panic(caught);
    assert_eq!(err.to_string(), "callback panicked: boom 42");

    let caught = panic::catch_unwind(|| panic::panic_any(7_u32)).unwrap_err();
    assert!(matches!(RxError::from_panic(caught), RxError::Panicked(_)));
  }

  #[rxpush_macro::test]
  fn custom_is_transparent_and_cloneable() {
    let err = RxError::custom(IoLike);
    let cloned = err.clone();
    assert_eq!(cloned.to_string(), "io went wrong");
    assert!(cloned.source().is_none());
    assert!(!err.is_disposed());
    assert!(RxError::AlreadyDisposed.is_disposed());
  }
}
