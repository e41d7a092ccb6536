//! The subscribe side of the protocol.
//!
//! An [`Observable`] is anything a [`Subscriber`] can be attached to. The
//! trait is object safe: chains can be erased into a [`BoxObservable`] and
//! stored or shared freely. Everything else (subscribing with closures,
//! operators) lives on the blanket [`ObservableExt`].
//!
//! # Subscribe protocol
//!
//! [`ObservableExt::subscribe`] wraps the observer in a [`Subscriber`] and
//! hands it to [`Observable::subscribe_core`]. If the hook fails or panics,
//! the subscriber is disposed before the error reaches the caller, so no
//! half-attached observer is left behind. On success the producer-side
//! handle becomes the subscriber's upstream and the subscriber itself is
//! returned as the subscription.

use std::{
  future::Future,
  panic::{self, AssertUnwindSafe},
  sync::Arc,
  time::Duration,
};

use crate::{
  completion::Completion,
  disposable::{BoxDisposable, Disposable},
  error::RxError,
  observer::{from_fn, from_fns, Observer, Subscriber},
  ops::{
    delay::{Delay, DelayFrame},
    filter::{Filter, FilterMap},
    map::Map,
    on_error_resume_as_failure::OnErrorResumeAsFailure,
    select_await::{AwaitOptions, SelectAwait},
    take::Take,
  },
  scheduler::{FrameProvider, TimeProvider},
};

mod create;
mod from_iter;
mod timer;
mod trivial;

pub use create::{create, Create};
pub use from_iter::{from_iter, of, FromIter, Of};
pub use timer::{
  interval, interval_frame, timer, timer_frame, Interval, IntervalFrame, TimerFrame,
  TimerObservable,
};
pub use trivial::{empty, never, throw, Empty, Never, Throw};

/// A producer of signals.
pub trait Observable<T>: Send + Sync {
  /// Attaches `subscriber` and returns the producer-side resource.
  ///
  /// Implementations deliver into `subscriber` only; the caller owns the
  /// subscription's lifecycle.
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError>;
}

impl<T, O: Observable<T> + ?Sized> Observable<T> for Arc<O> {
  #[inline]
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    (**self).subscribe_core(subscriber)
  }
}

impl<T, O: Observable<T> + ?Sized> Observable<T> for Box<O> {
  #[inline]
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    (**self).subscribe_core(subscriber)
  }
}

/// Type-erased, shareable observable.
pub type BoxObservable<T> = Arc<dyn Observable<T>>;

/// Subscribes `observer` to `source`; see the module docs for the protocol.
pub fn subscribe_observer<T, S>(
  source: &S,
  observer: impl Observer<T> + 'static,
) -> Result<BoxDisposable, RxError>
where
  T: 'static,
  S: Observable<T> + ?Sized,
{
  let subscriber = Subscriber::new(observer);
  let attached = panic::catch_unwind(AssertUnwindSafe(|| source.subscribe_core(subscriber.clone())))
    .unwrap_or_else(|payload| Err(RxError::from_panic(payload)));
  match attached {
    Ok(upstream) => {
      subscriber.set_upstream(upstream)?;
      Ok(Box::new(subscriber))
    }
    Err(err) => {
      subscriber.dispose();
      Err(err)
    }
  }
}

/// Subscribing helpers and operators for every observable.
pub trait ObservableExt<T: 'static>: Observable<T> + Sized {
  fn subscribe(&self, observer: impl Observer<T> + 'static) -> Result<BoxDisposable, RxError> {
    subscribe_observer(self, observer)
  }

  /// Subscribes with a value handler only; unhandled failures go to the
  /// process-wide sink.
  fn subscribe_next<N>(&self, next: N) -> Result<BoxDisposable, RxError>
  where
    N: Fn(T) + Send + Sync + 'static,
  {
    self.subscribe(from_fn(next))
  }

  fn subscribe_all<N, E, C>(
    &self, next: N, error: E, completed: C,
  ) -> Result<BoxDisposable, RxError>
  where
    N: Fn(T) + Send + Sync + 'static,
    E: Fn(RxError) + Send + Sync + 'static,
    C: Fn(Completion) + Send + Sync + 'static,
  {
    self.subscribe(from_fns(next, error, completed))
  }

  fn boxed(self) -> BoxObservable<T>
  where
    Self: 'static,
  {
    Arc::new(self)
  }

  fn map<U, F>(self, func: F) -> Map<Self, F, T>
  where
    F: Fn(T) -> U + Send + Sync + 'static,
  {
    Map::new(self, func)
  }

  fn filter<F>(self, predicate: F) -> Filter<Self, F>
  where
    F: Fn(&T) -> bool + Send + Sync + 'static,
  {
    Filter::new(self, predicate)
  }

  /// Maps and filters in one step: `None` results are dropped.
  fn filter_map<U, F>(self, func: F) -> FilterMap<Self, F, T>
  where
    F: Fn(T) -> Option<U> + Send + Sync + 'static,
  {
    FilterMap::new(self, func)
  }

  /// Emits the first `count` values, then completes.
  fn take(self, count: usize) -> Take<Self> { Take::new(self, count) }

  /// Ends the stream with a failure on the first resumable error.
  fn on_error_resume_as_failure(self) -> OnErrorResumeAsFailure<Self> {
    OnErrorResumeAsFailure::new(self)
  }

  /// Shifts values, resumable errors and a successful completion by `due`
  /// of `provider` time. A failure is forwarded at once and drops whatever
  /// is still queued.
  fn delay(self, due: Duration, provider: impl TimeProvider + 'static) -> Delay<Self> {
    Delay::new(self, due, Arc::new(provider))
  }

  /// Same as [`delay`](Self::delay), counted in `frames` ticks of
  /// `provider`.
  fn delay_frame(self, frames: u64, provider: impl FrameProvider + 'static) -> DelayFrame<Self> {
    DelayFrame::new(self, frames, Arc::new(provider))
  }

  /// Projects every value through an async `selector` under the overlap
  /// policy of `options`.
  fn select_await<U, F, Fut>(self, options: AwaitOptions, selector: F) -> SelectAwait<Self, F, T>
  where
    T: Send,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U, RxError>> + Send + 'static,
  {
    SelectAwait::new(self, options, selector)
  }

  /// Keeps the values an async `predicate` accepts.
  fn where_await<F, Fut>(self, options: AwaitOptions, predicate: F) -> BoxObservable<T>
  where
    Self: 'static,
    T: Clone + Send,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, RxError>> + Send + 'static,
  {
    let predicate = Arc::new(predicate);
    self
      .select_await(options, move |value: T| {
        let verdict = predicate(value.clone());
        async move { verdict.await.map(|keep| keep.then_some(value)) }
      })
      .filter_map(|kept: Option<T>| kept)
      .boxed()
  }
}

impl<T: 'static, O: Observable<T>> ObservableExt<T> for O {}
