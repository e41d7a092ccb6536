use std::{marker::PhantomData, sync::Arc};

use super::forward_error_and_completion;
use crate::{
  disposable::BoxDisposable,
  error::RxError,
  observable::{subscribe_observer, Observable},
  observer::{Observer, Subscriber},
};

/// Forwards the values a predicate accepts.
pub struct Filter<S, F> {
  source: S,
  predicate: Arc<F>,
}

impl<S, F> Filter<S, F> {
  pub(crate) fn new(source: S, predicate: F) -> Self {
    Filter { source, predicate: Arc::new(predicate) }
  }
}

impl<T, S, F> Observable<T> for Filter<S, F>
where
  T: 'static,
  S: Observable<T>,
  F: Fn(&T) -> bool + Send + Sync + 'static,
{
  fn subscribe_core(&self, downstream: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    let observer = FilterObserver { downstream, predicate: self.predicate.clone() };
    subscribe_observer(&self.source, observer)
  }
}

struct FilterObserver<T, F> {
  downstream: Subscriber<T>,
  predicate: Arc<F>,
}

impl<T, F> Observer<T> for FilterObserver<T, F>
where
  F: Fn(&T) -> bool + Send + Sync,
{
  fn on_next(&self, value: T) {
    if (self.predicate)(&value) {
      self.downstream.on_next(value);
    }
  }

  forward_error_and_completion!(downstream);
}

/// Maps every value to an `Option` and forwards the `Some`s.
pub struct FilterMap<S, F, T> {
  source: S,
  func: Arc<F>,
  _marker: PhantomData<fn(T)>,
}

impl<S, F, T> FilterMap<S, F, T> {
  pub(crate) fn new(source: S, func: F) -> Self {
    FilterMap { source, func: Arc::new(func), _marker: PhantomData }
  }
}

impl<T, U, S, F> Observable<U> for FilterMap<S, F, T>
where
  T: 'static,
  U: 'static,
  S: Observable<T>,
  F: Fn(T) -> Option<U> + Send + Sync + 'static,
{
  fn subscribe_core(&self, downstream: Subscriber<U>) -> Result<BoxDisposable, RxError> {
    subscribe_observer(&self.source, FilterMapObserver { downstream, func: self.func.clone() })
  }
}

struct FilterMapObserver<U, F> {
  downstream: Subscriber<U>,
  func: Arc<F>,
}

impl<T, U, F> Observer<T> for FilterMapObserver<U, F>
where
  F: Fn(T) -> Option<U> + Send + Sync,
{
  fn on_next(&self, value: T) {
    if let Some(mapped) = (self.func)(value) {
      self.downstream.on_next(mapped);
    }
  }

  forward_error_and_completion!(downstream);
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxpush_macro::test]
  fn keeps_matching_values() {
    let recorder = Recorder::new();
    observable::from_iter(0..10).filter(|v| v % 3 == 0).subscribe(recorder.clone()).unwrap();
    assert_eq!(recorder.values(), vec![0, 3, 6, 9]);
  }

  #[rxpush_macro::test]
  fn filter_map_drops_none() {
    let recorder = Recorder::new();
    observable::from_iter(vec!["1", "x", "3"])
      .filter_map(|s: &str| s.parse::<i32>().ok())
      .subscribe(recorder.clone())
      .unwrap();
    assert_eq!(recorder.values(), vec![1, 3]);
  }
}
