use super::Observable;
use crate::{
  completion::Completion,
  disposable::{BoxDisposable, DisposableExt, EmptyDisposable},
  error::RxError,
  observer::{Observer, Subscriber},
};

/// Emits every item of an iterable, then completes.
///
/// Emission is synchronous and stops early once the subscriber is closed,
/// so an endless iterator is fine in front of [`take`](super::ObservableExt::take).
#[derive(Clone)]
pub struct FromIter<I>(I);

pub fn from_iter<I>(iter: I) -> FromIter<I>
where
  I: IntoIterator + Clone,
{
  FromIter(iter)
}

impl<I> Observable<I::Item> for FromIter<I>
where
  I: IntoIterator + Clone + Send + Sync,
{
  fn subscribe_core(&self, subscriber: Subscriber<I::Item>) -> Result<BoxDisposable, RxError> {
    for item in self.0.clone() {
      if subscriber.is_closed() {
        return Ok(EmptyDisposable.into_boxed());
      }
      subscriber.on_next(item);
    }
    subscriber.on_completed(Completion::Success);
    Ok(EmptyDisposable.into_boxed())
  }
}

/// Emits one value, then completes.
#[derive(Clone)]
pub struct Of<T>(T);

pub fn of<T: Clone>(value: T) -> Of<T> { Of(value) }

impl<T> Observable<T> for Of<T>
where
  T: Clone + Send + Sync,
{
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    subscriber.on_next(self.0.clone());
    subscriber.on_completed(Completion::Success);
    Ok(EmptyDisposable.into_boxed())
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxpush_macro::test]
  fn emits_all_then_completes() {
    let recorder = Recorder::new();
    observable::from_iter(vec![1, 2, 3]).subscribe(recorder.clone()).unwrap();
    assert_eq!(recorder.values(), vec![1, 2, 3]);
    assert!(recorder.completion().unwrap().is_success());
  }

  #[rxpush_macro::test]
  fn endless_source_stops_when_downstream_closes() {
    let recorder = Recorder::new();
    observable::from_iter(0..).take(3).subscribe(recorder.clone()).unwrap();
    assert_eq!(recorder.values(), vec![0, 1, 2]);
  }

  #[rxpush_macro::test]
  fn of_replays_per_subscription() {
    let source = observable::of("x");
    let recorder = Recorder::new();
    source.subscribe(recorder.clone()).unwrap();
    source.subscribe(recorder.clone()).unwrap();
    assert_eq!(recorder.values(), vec!["x", "x"]);
  }
}
