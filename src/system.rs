//! Process-wide unhandled-error sink.
//!
//! Resumable errors and failure completions that reach an observer without a
//! handler, and panics caught at a dispatch boundary, end up here instead of
//! being dropped or unwinding into a producer. The default handler logs the
//! error and lets delivery continue; hosts may install their own.
//!
//! This is the only global state of the crate.

use std::{
  panic::{self, AssertUnwindSafe},
  sync::Arc,
};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::RxError;

type UnhandledHandler = Arc<dyn Fn(&RxError) + Send + Sync>;

static UNHANDLED: Lazy<RwLock<UnhandledHandler>> = Lazy::new(|| RwLock::new(default_handler()));

fn default_handler() -> UnhandledHandler {
  Arc::new(|err: &RxError| tracing::error!(error = %err, "unhandled error in reactive pipeline"))
}

/// Replaces the process-wide unhandled-error handler.
pub fn set_unhandled_exception_handler<F>(handler: F)
where
  F: Fn(&RxError) + Send + Sync + 'static,
{
  *UNHANDLED.write() = Arc::new(handler);
}

/// Restores the default log-and-continue handler.
pub fn reset_unhandled_exception_handler() { *UNHANDLED.write() = default_handler(); }

/// Routes `err` to the installed handler.
///
/// The handler runs outside the registration lock, so it may itself replace
/// the handler. A panicking handler is logged and swallowed.
pub fn report_unhandled(err: &RxError) {
  let handler = UNHANDLED.read().clone();
  if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(err))) {
    let panic_err = RxError::from_panic(payload);
    tracing::error!(error = %err, handler_panic = %panic_err, "unhandled-error handler panicked");
  }
}


#[cfg(test)]
mod tests {
  use super::{test_support::capture_unhandled, *};

  #[rxpush_macro::test]
  fn installed_handler_receives_reports() {
    let (_, errors) = capture_unhandled("sink-marker", || {
      report_unhandled(&RxError::msg("sink-marker one"));
      report_unhandled(&RxError::msg("unrelated"));
      report_unhandled(&RxError::msg("sink-marker two"));
    });
    let messages: Vec<_> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(messages, ["sink-marker one", "sink-marker two"]);
  }

  #[rxpush_macro::test]
  fn panicking_handler_does_not_unwind_into_caller() {
    let (_, errors) = capture_unhandled("never-matches", || {
      set_unhandled_exception_handler(|_| panic!("handler exploded"));
      report_unhandled(&RxError::msg("anything"));
    });
    assert!(errors.is_empty());
  }
}
