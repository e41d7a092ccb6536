use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use once_cell::sync::OnceCell;

use super::subject_subscription::SubjectSubscription;
use crate::{
  completion::Completion,
  disposable::{BoxDisposable, DisposableExt, EmptyDisposable},
  error::RxError,
  observer::{Observer, Subscriber},
  registry::FreeList,
};

/// Registry plus terminal state shared by every subject flavor.
///
/// # Design
///
/// - **Terminal state**: `terminal` is set once; whoever sets it performs
///   the fan-out and every later `complete` is a no-op. Disposal also sets
///   it, which is how attached observers receive the synthetic completion.
/// - **Fan-out**: iterates a lock-free registry snapshot, so observers may
///   subscribe or unsubscribe from inside a callback.
/// - **Late subscribers**: a subscriber added while a completion races it
///   checks the terminal state again after registration; [`Subscriber`]
///   drops the duplicate if the fan-out also reached it.
pub(crate) struct SubjectCore<T> {
  observers: FreeList<Subscriber<T>>,
  terminal: OnceCell<Completion>,
  disposed: AtomicBool,
}

impl<T> Default for SubjectCore<T> {
  fn default() -> Self {
    SubjectCore {
      observers: FreeList::new(),
      terminal: OnceCell::new(),
      disposed: AtomicBool::new(false),
    }
  }
}

impl<T> SubjectCore<T> {
  #[inline]
  pub(crate) fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }

  #[inline]
  pub(crate) fn is_stopped(&self) -> bool { self.terminal.get().is_some() || self.is_disposed() }

  pub(crate) fn terminal(&self) -> Option<&Completion> { self.terminal.get() }

  pub(crate) fn observer_count(&self) -> usize { self.observers.count() }

  pub(crate) fn next(&self, value: T)
  where
    T: Clone,
  {
    if self.is_stopped() {
      return;
    }
    for observer in self.observers.snapshot().iter() {
      observer.on_next(value.clone());
    }
  }

  pub(crate) fn error_resume(&self, err: RxError) {
    if self.is_stopped() {
      return;
    }
    for observer in self.observers.snapshot().iter() {
      observer.on_error_resume(err.clone());
    }
  }

  pub(crate) fn complete(&self, completion: Completion) {
    if self.is_disposed() || self.terminal.set(completion.clone()).is_err() {
      return;
    }
    self.fan_out_completion(&completion);
  }

  fn fan_out_completion(&self, completion: &Completion) {
    for observer in self.observers.snapshot().iter() {
      observer.on_completed(completion.clone());
    }
    self.observers.dispose();
  }

  /// Attaches `subscriber`, or replays the terminal signal to it when the
  /// subject already ended.
  pub(crate) fn subscribe(
    self: &Arc<Self>,
    subscriber: Subscriber<T>,
  ) -> Result<BoxDisposable, RxError>
  where
    T: 'static,
  {
    if self.is_disposed() {
      return Err(RxError::AlreadyDisposed);
    }
    if let Some(completion) = self.terminal.get() {
      subscriber.on_completed(completion.clone());
      return Ok(EmptyDisposable.into_boxed());
    }

    let item = Arc::new(subscriber);
    let key = match self.observers.add(item.clone()) {
      Ok(key) => key,
      Err(err) => {
        // The registry was torn down after the checks above.
        return match self.terminal.get() {
          Some(completion) if !self.is_disposed() => {
            item.on_completed(completion.clone());
            Ok(EmptyDisposable.into_boxed())
          }
          _ => Err(err),
        };
      }
    };
    if let Some(completion) = self.terminal.get() {
      item.on_completed(completion.clone());
    }
    Ok(Box::new(SubjectSubscription::new(Arc::downgrade(self), key, &item)))
  }

  pub(crate) fn remove(&self, key: usize, item: &Arc<Subscriber<T>>) -> bool {
    self.observers.remove(key, item)
  }

  /// Completes attached observers with a synthetic success unless the
  /// subject already ended, then tears the registry down.
  pub(crate) fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    if self.terminal.set(Completion::Success).is_ok() {
      let attached = self.observers.count();
      if attached > 0 {
        tracing::debug!(observers = attached, "subject disposed with attached observers");
      }
      self.fan_out_completion(&Completion::Success);
    } else {
      self.observers.dispose();
    }
  }
}
