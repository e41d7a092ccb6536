use std::{marker::PhantomData, sync::Arc};

use super::forward_error_and_completion;
use crate::{
  disposable::BoxDisposable,
  error::RxError,
  observable::{subscribe_observer, Observable},
  observer::{Observer, Subscriber},
};

/// Applies a function to every value.
///
/// A panicking function surfaces as a resumable error for that value.
pub struct Map<S, F, T> {
  source: S,
  func: Arc<F>,
  _marker: PhantomData<fn(T)>,
}

impl<S, F, T> Map<S, F, T> {
  pub(crate) fn new(source: S, func: F) -> Self {
    Map { source, func: Arc::new(func), _marker: PhantomData }
  }
}

impl<T, U, S, F> Observable<U> for Map<S, F, T>
where
  T: 'static,
  U: 'static,
  S: Observable<T>,
  F: Fn(T) -> U + Send + Sync + 'static,
{
  fn subscribe_core(&self, downstream: Subscriber<U>) -> Result<BoxDisposable, RxError> {
    subscribe_observer(&self.source, MapObserver { downstream, func: self.func.clone() })
  }
}

struct MapObserver<U, F> {
  downstream: Subscriber<U>,
  func: Arc<F>,
}

impl<T, U, F> Observer<T> for MapObserver<U, F>
where
  F: Fn(T) -> U + Send + Sync,
{
  fn on_next(&self, value: T) { self.downstream.on_next((self.func)(value)) }

  forward_error_and_completion!(downstream);
}
