use std::{cell::RefCell, sync::Arc};

use parking_lot::ReentrantMutex;

use super::subject_core::SubjectCore;
use crate::{
  completion::Completion,
  disposable::{BoxDisposable, Disposable},
  error::RxError,
  observable::Observable,
  observer::{Observer, Subscriber},
};

struct BehaviorInner<T> {
  core: Arc<SubjectCore<T>>,
  /// Held across "store and fan out" and "hand out and attach", so a new
  /// subscriber never misses nor repeats a value. Reentrant because a
  /// subscriber may push into the subject from its own callback.
  latest: ReentrantMutex<RefCell<T>>,
}

/// Hub that remembers its latest value.
///
/// Every new subscriber first receives the current value, then the live
/// signals. After a completion, late subscribers receive the last value
/// followed by the terminal signal.
pub struct BehaviorSubject<T> {
  inner: Arc<BehaviorInner<T>>,
}

impl<T> Clone for BehaviorSubject<T> {
  fn clone(&self) -> Self { BehaviorSubject { inner: self.inner.clone() } }
}

impl<T: Clone> BehaviorSubject<T> {
  pub fn new(initial: T) -> Self {
    BehaviorSubject {
      inner: Arc::new(BehaviorInner {
        core: Arc::new(SubjectCore::default()),
        latest: ReentrantMutex::new(RefCell::new(initial)),
      }),
    }
  }

  /// The current value.
  pub fn value(&self) -> T { self.inner.latest.lock().borrow().clone() }

  pub fn observer_count(&self) -> usize { self.inner.core.observer_count() }
}

impl<T: Clone + Send> Observer<T> for BehaviorSubject<T> {
  fn on_next(&self, value: T) {
    let latest = self.inner.latest.lock();
    if self.inner.core.is_stopped() {
      return;
    }
    *latest.borrow_mut() = value.clone();
    self.inner.core.next(value);
  }

  fn on_error_resume(&self, err: RxError) { self.inner.core.error_resume(err) }

  fn on_completed(&self, completion: Completion) {
    let _latest = self.inner.latest.lock();
    self.inner.core.complete(completion);
  }

  fn is_closed(&self) -> bool { self.inner.core.is_stopped() }
}

impl<T: Clone + Send + 'static> Observable<T> for BehaviorSubject<T> {
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    let latest = self.inner.latest.lock();
    if self.inner.core.is_disposed() {
      return Err(RxError::AlreadyDisposed);
    }
    let current = latest.borrow().clone();
    subscriber.on_next(current);
    self.inner.core.subscribe(subscriber)
  }
}

impl<T: Send> Disposable for BehaviorSubject<T> {
  fn dispose(&self) { self.inner.core.dispose() }

  fn is_disposed(&self) -> bool { self.inner.core.is_disposed() }
}
