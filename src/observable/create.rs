use std::marker::PhantomData;

use super::Observable;
use crate::{disposable::BoxDisposable, error::RxError, observer::Subscriber};

/// Observable backed by a subscribe function.
///
/// Created by [`create`].
pub struct Create<F, T> {
  subscribe: F,
  _marker: PhantomData<fn() -> T>,
}

/// Builds an observable from the function run on every subscription.
///
/// The function receives the subscription's [`Subscriber`], which it may
/// keep and push into from any thread, and returns the resource released
/// when the subscription ends.
///
/// ```rust
/// use rxpush::prelude::*;
///
/// let source = observable::create(|subscriber: Subscriber<i32>| {
///   subscriber.on_next(1);
///   subscriber.on_next(2);
///   subscriber.on_completed(Completion::Success);
///   Ok(disposable::empty().into_boxed())
/// });
/// source.subscribe_next(|v| println!("{v}")).unwrap();
/// ```
pub fn create<T, F>(subscribe: F) -> Create<F, T>
where
  F: Fn(Subscriber<T>) -> Result<BoxDisposable, RxError> + Send + Sync,
{
  Create { subscribe, _marker: PhantomData }
}

impl<T, F> Observable<T> for Create<F, T>
where
  F: Fn(Subscriber<T>) -> Result<BoxDisposable, RxError> + Send + Sync,
{
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    (self.subscribe)(subscriber)
  }
}
