use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::Disposable;

/// Runs a cleanup action the first time it is disposed.
pub struct AnonymousDisposable {
  action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
  disposed: AtomicBool,
}

impl AnonymousDisposable {
  pub fn new<F>(action: F) -> Self
  where
    F: FnOnce() + Send + 'static,
  {
    AnonymousDisposable {
      action: Mutex::new(Some(Box::new(action))),
      disposed: AtomicBool::new(false),
    }
  }
}

impl Disposable for AnonymousDisposable {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    // Take the action out first so it runs without the lock held.
    let action = self.action.lock().take();
    if let Some(action) = action {
      action();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

/// Creates a disposable that runs `action` exactly once.
pub fn create<F>(action: F) -> AnonymousDisposable
where
  F: FnOnce() + Send + 'static,
{
  AnonymousDisposable::new(action)
}

/// A handle with nothing to release.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDisposable;

impl Disposable for EmptyDisposable {
  #[inline]
  fn dispose(&self) {}

  #[inline]
  fn is_disposed(&self) -> bool { true }
}

/// The empty sentinel.
#[inline]
pub fn empty() -> EmptyDisposable { EmptyDisposable }

/// A flag that only records whether it was disposed.
#[derive(Debug, Default)]
pub struct BooleanDisposable(AtomicBool);

impl BooleanDisposable {
  pub fn new() -> Self { Self::default() }
}

impl Disposable for BooleanDisposable {
  #[inline]
  fn dispose(&self) { self.0.store(true, Ordering::Release); }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.load(Ordering::Acquire) }
}
