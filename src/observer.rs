//! The push side of the protocol.
//!
//! An [`Observer`] receives three kinds of signal: values, resumable errors
//! and one terminal [`Completion`]. Producers never call a user observer
//! directly; every observer is wrapped in a [`Subscriber`] first, which
//! enforces the delivery contract:
//!
//! - nothing is delivered after the subscription was disposed,
//! - `on_completed` is delivered at most once and disposes the subscription,
//! - a panic in a callback never unwinds into the producer's dispatch loop.

use std::{
  panic::{self, AssertUnwindSafe},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;

use crate::{
  completion::{Completion, Notification},
  disposable::{BoxDisposable, Disposable, SingleAssignmentDisposable},
  error::RxError,
  system::report_unhandled,
};

/// Consumer of a stream.
///
/// All methods take `&self`: an observer may be shared between several
/// producers and receive signals from any thread, so implementations
/// synchronize their own state.
pub trait Observer<T>: Send + Sync {
  fn on_next(&self, value: T);

  /// A failure that does not end the stream.
  fn on_error_resume(&self, err: RxError);

  /// The terminal signal.
  fn on_completed(&self, completion: Completion);

  /// `true` once further signals would be ignored.
  ///
  /// Synchronous producers poll this to stop emitting early; operator
  /// observers forward it to their downstream.
  fn is_closed(&self) -> bool { false }
}

impl<T, O: Observer<T> + ?Sized> Observer<T> for Box<O> {
  #[inline]
  fn on_next(&self, value: T) { (**self).on_next(value) }

  #[inline]
  fn on_error_resume(&self, err: RxError) { (**self).on_error_resume(err) }

  #[inline]
  fn on_completed(&self, completion: Completion) { (**self).on_completed(completion) }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

impl<T, O: Observer<T> + ?Sized> Observer<T> for Arc<O> {
  #[inline]
  fn on_next(&self, value: T) { (**self).on_next(value) }

  #[inline]
  fn on_error_resume(&self, err: RxError) { (**self).on_error_resume(err) }

  #[inline]
  fn on_completed(&self, completion: Completion) { (**self).on_completed(completion) }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

struct SubscriberCore<T> {
  sink: Box<dyn Observer<T>>,
  disposed: AtomicBool,
  completing: AtomicBool,
  upstream: SingleAssignmentDisposable,
}

/// Guarded observer handle: one per subscription.
///
/// A `Subscriber` is both the observer a producer pushes into and the
/// disposal handle of that subscription. Cloning shares the same
/// subscription.
///
/// # Design
///
/// The subscriber's only link back to its producer is the `upstream`
/// single-assignment handle, used solely to tear the producer side down.
/// Completion flips `completing` before the sink runs, so a completion
/// racing with another completion or with a late `on_next` is delivered
/// once and nothing follows it.
pub struct Subscriber<T>(Arc<SubscriberCore<T>>);

impl<T> Clone for Subscriber<T> {
  fn clone(&self) -> Self { Subscriber(self.0.clone()) }
}

impl<T> Subscriber<T> {
  pub fn new(observer: impl Observer<T> + 'static) -> Self { Self::from_boxed(Box::new(observer)) }

  pub fn from_boxed(sink: Box<dyn Observer<T>>) -> Self {
    Subscriber(Arc::new(SubscriberCore {
      sink,
      disposed: AtomicBool::new(false),
      completing: AtomicBool::new(false),
      upstream: SingleAssignmentDisposable::new(),
    }))
  }

  /// Attaches the producer-side resource. If the subscription is already
  /// disposed the resource is disposed immediately.
  pub fn set_upstream(&self, upstream: BoxDisposable) -> Result<(), RxError> {
    self.0.upstream.set(upstream)
  }

  #[inline]
  fn is_inert(&self) -> bool {
    self.0.disposed.load(Ordering::Acquire) || self.0.completing.load(Ordering::Acquire)
  }

  /// Whether two handles refer to the same subscription.
  pub fn same_subscription(&self, other: &Subscriber<T>) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> Observer<T> for Subscriber<T> {
  fn on_next(&self, value: T) {
    if self.is_inert() {
      return;
    }
    let sink = &self.0.sink;
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.on_next(value))) {
      self.on_error_resume(RxError::from_panic(payload));
    }
  }

  fn on_error_resume(&self, err: RxError) {
    if self.is_inert() {
      return;
    }
    let sink = &self.0.sink;
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.on_error_resume(err))) {
      report_unhandled(&RxError::from_panic(payload));
    }
  }

  fn on_completed(&self, completion: Completion) {
    if self.0.completing.swap(true, Ordering::AcqRel) || self.0.disposed.load(Ordering::Acquire) {
      return;
    }
    let sink = &self.0.sink;
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.on_completed(completion))) {
      report_unhandled(&RxError::from_panic(payload));
    }
    self.dispose();
  }

  fn is_closed(&self) -> bool { self.is_inert() || self.0.sink.is_closed() }
}

impl<T> Disposable for Subscriber<T> {
  fn dispose(&self) {
    if self.0.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    self.0.upstream.dispose();
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.disposed.load(Ordering::Acquire) }
}

/// Observer built from closures.
#[derive(Clone)]
pub struct FnObserver<N, E, C> {
  next: N,
  error: E,
  completed: C,
}

impl<T, N, E, C> Observer<T> for FnObserver<N, E, C>
where
  N: Fn(T) + Send + Sync,
  E: Fn(RxError) + Send + Sync,
  C: Fn(Completion) + Send + Sync,
{
  #[inline]
  fn on_next(&self, value: T) { (self.next)(value) }

  #[inline]
  fn on_error_resume(&self, err: RxError) { (self.error)(err) }

  #[inline]
  fn on_completed(&self, completion: Completion) { (self.completed)(completion) }
}

/// Resumable errors nobody handles end up in the unhandled sink.
pub fn unhandled_error_resume(err: RxError) { report_unhandled(&err) }

/// Failure completions nobody handles end up in the unhandled sink.
pub fn unhandled_completion(completion: Completion) {
  if let Completion::Failure(err) = completion {
    report_unhandled(&err);
  }
}

/// Observer that only handles values.
pub fn from_fn<T, N>(next: N) -> FnObserver<N, fn(RxError), fn(Completion)>
where
  N: Fn(T) + Send + Sync,
{
  FnObserver { next, error: unhandled_error_resume, completed: unhandled_completion }
}

/// Observer handling all three signal kinds.
pub fn from_fns<T, N, E, C>(next: N, error: E, completed: C) -> FnObserver<N, E, C>
where
  N: Fn(T) + Send + Sync,
  E: Fn(RxError) + Send + Sync,
  C: Fn(Completion) + Send + Sync,
{
  FnObserver { next, error, completed }
}

/// Observer that materializes every signal it receives.
pub struct Recorder<T> {
  log: Arc<Mutex<Vec<Notification<T>>>>,
}

impl<T> Clone for Recorder<T> {
  fn clone(&self) -> Self { Recorder { log: self.log.clone() } }
}

impl<T> Default for Recorder<T> {
  fn default() -> Self { Recorder { log: Arc::new(Mutex::new(Vec::new())) } }
}

impl<T: Clone> Recorder<T> {
  pub fn new() -> Self { Self::default() }

  pub fn notifications(&self) -> Vec<Notification<T>> { self.log.lock().clone() }

  pub fn values(&self) -> Vec<T> {
    self.log.lock().iter().filter_map(Notification::value).cloned().collect()
  }

  pub fn errors(&self) -> Vec<RxError> {
    let log = self.log.lock();
    log
      .iter()
      .filter_map(|n| match n {
        Notification::ErrorResume(err) => Some(err.clone()),
        _ => None,
      })
      .collect()
  }

  /// The terminal signal, if one arrived.
  pub fn completion(&self) -> Option<Completion> {
    self.log.lock().iter().find_map(|n| match n {
      Notification::Completed(c) => Some(c.clone()),
      _ => None,
    })
  }

  pub fn is_completed(&self) -> bool { self.completion().is_some() }
}

impl<T: Send> Observer<T> for Recorder<T> {
  fn on_next(&self, value: T) { self.log.lock().push(Notification::Next(value)); }

  fn on_error_resume(&self, err: RxError) { self.log.lock().push(Notification::ErrorResume(err)); }

  fn on_completed(&self, completion: Completion) {
    self.log.lock().push(Notification::Completed(completion));
  }
}
