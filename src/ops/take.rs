use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
  completion::Completion,
  disposable::{BoxDisposable, DisposableExt, EmptyDisposable},
  error::RxError,
  observable::{subscribe_observer, Observable},
  observer::{Observer, Subscriber},
};

/// Emits only the first `count` values of the source, then completes.
///
/// If the source emits fewer values, its own completion is forwarded. A
/// zero count completes on subscribe without touching the source.
pub struct Take<S> {
  source: S,
  count: usize,
}

impl<S> Take<S> {
  pub(crate) fn new(source: S, count: usize) -> Self { Take { source, count } }
}

impl<T, S> Observable<T> for Take<S>
where
  T: 'static,
  S: Observable<T>,
{
  fn subscribe_core(&self, downstream: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    if self.count == 0 {
      downstream.on_completed(Completion::Success);
      return Ok(EmptyDisposable.into_boxed());
    }
    subscribe_observer(
      &self.source,
      TakeObserver { downstream, remaining: AtomicUsize::new(self.count) },
    )
  }
}

struct TakeObserver<T> {
  downstream: Subscriber<T>,
  remaining: AtomicUsize,
}

impl<T> Observer<T> for TakeObserver<T> {
  fn on_next(&self, value: T) {
    let claimed =
      self.remaining.fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1));
    if let Ok(left) = claimed {
      self.downstream.on_next(value);
      if left == 1 {
        self.downstream.on_completed(Completion::Success);
      }
    }
  }

  fn on_error_resume(&self, err: RxError) { self.downstream.on_error_resume(err) }

  fn on_completed(&self, completion: Completion) { self.downstream.on_completed(completion) }

  fn is_closed(&self) -> bool {
    self.remaining.load(Ordering::Acquire) == 0 || self.downstream.is_closed()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  };

  use crate::prelude::*;

  #[rxpush_macro::test]
  fn completes_after_count_and_releases_source() {
    let subject = Subject::new();
    let recorder = Recorder::new();
    subject.clone().take(2).subscribe(recorder.clone()).unwrap();
    assert_eq!(subject.observer_count(), 1);

    subject.on_next(1);
    subject.on_next(2);
    subject.on_next(3);
    assert_eq!(recorder.values(), vec![1, 2]);
    assert!(recorder.completion().unwrap().is_success());
    assert_eq!(subject.observer_count(), 0);
  }

  #[rxpush_macro::test]
  fn zero_never_subscribes_upstream() {
    let touched = Arc::new(AtomicBool::new(false));
    let c_touched = touched.clone();
    let source = observable::create(move |_: Subscriber<i32>| {
      c_touched.store(true, Ordering::SeqCst);
      Ok(disposable::empty().into_boxed())
    });
    let recorder = Recorder::new();
    source.take(0).subscribe(recorder.clone()).unwrap();
    assert!(recorder.is_completed());
    assert!(!touched.load(Ordering::SeqCst));
  }
}
