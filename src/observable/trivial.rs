use std::marker::PhantomData;

use super::Observable;
use crate::{
  completion::Completion,
  disposable::{BoxDisposable, DisposableExt, EmptyDisposable},
  error::RxError,
  observer::{Observer, Subscriber},
};

/// Completes immediately without values.
pub struct Empty<T>(PhantomData<fn() -> T>);

pub fn empty<T>() -> Empty<T> { Empty(PhantomData) }

impl<T> Observable<T> for Empty<T> {
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    subscriber.on_completed(Completion::Success);
    Ok(EmptyDisposable.into_boxed())
  }
}

/// Never emits anything.
pub struct Never<T>(PhantomData<fn() -> T>);

pub fn never<T>() -> Never<T> { Never(PhantomData) }

impl<T> Observable<T> for Never<T> {
  fn subscribe_core(&self, _subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    Ok(EmptyDisposable.into_boxed())
  }
}

/// Completes immediately with a failure.
pub struct Throw<T> {
  err: RxError,
  _marker: PhantomData<fn() -> T>,
}

pub fn throw<T>(err: RxError) -> Throw<T> { Throw { err, _marker: PhantomData } }

impl<T> Observable<T> for Throw<T> {
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    subscriber.on_completed(Completion::Failure(self.err.clone()));
    Ok(EmptyDisposable.into_boxed())
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxpush_macro::test]
  fn terminal_only_factories() {
    let done = Recorder::<i32>::new();
    observable::empty().subscribe(done.clone()).unwrap();
    assert!(done.completion().unwrap().is_success());

    let silent = Recorder::<i32>::new();
    let subscription = observable::never().subscribe(silent.clone()).unwrap();
    assert!(silent.notifications().is_empty());
    subscription.dispose();

    let failed = Recorder::<i32>::new();
    observable::throw(RxError::msg("nope")).subscribe(failed.clone()).unwrap();
    assert_eq!(failed.values(), Vec::<i32>::new());
    assert!(failed.completion().unwrap().is_failure());
  }
}
