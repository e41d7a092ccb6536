//! Multicast hubs.
//!
//! A subject is an [`Observer`] and an [`Observable`] at once: signals
//! pushed into it are fanned out to every attached subscriber. Three
//! flavors are provided:
//!
//! - [`Subject`]: live signals only.
//! - [`BehaviorSubject`]: caches the latest value and hands it to every new
//!   subscriber.
//! - [`ReplaySubject`]: retains a bounded history, by count or by a time or
//!   frame window, and replays it to every new subscriber.
//!
//! All three share the terminal contract: the first completion wins, later
//! values are ignored, subscribing afterwards replays the terminal signal,
//! and disposing a live subject completes its subscribers with a synthetic
//! success. Subscribing to a disposed subject fails with
//! [`RxError::AlreadyDisposed`].
//!
//! Handles are cheap to clone and share the same hub.

use std::sync::Arc;

use crate::{
  completion::Completion,
  disposable::{BoxDisposable, Disposable},
  error::RxError,
  observable::Observable,
  observer::{Observer, Subscriber},
};

mod behavior_subject;
mod replay_subject;
mod subject_core;
mod subject_subscription;

pub use behavior_subject::BehaviorSubject;
pub use replay_subject::{ReplaySubject, Window};
use subject_core::SubjectCore;

/// Hub forwarding live signals to its subscribers.
pub struct Subject<T> {
  core: Arc<SubjectCore<T>>,
}

impl<T> Clone for Subject<T> {
  fn clone(&self) -> Self { Subject { core: self.core.clone() } }
}

impl<T> Default for Subject<T> {
  fn default() -> Self { Subject { core: Arc::new(SubjectCore::default()) } }
}

impl<T> Subject<T> {
  pub fn new() -> Self { Self::default() }

  /// Number of attached subscribers.
  pub fn observer_count(&self) -> usize { self.core.observer_count() }

  /// `true` once a completion was pushed or the subject was disposed.
  pub fn is_stopped(&self) -> bool { self.core.is_stopped() }
}

impl<T: Clone> Observer<T> for Subject<T> {
  fn on_next(&self, value: T) { self.core.next(value) }

  fn on_error_resume(&self, err: RxError) { self.core.error_resume(err) }

  fn on_completed(&self, completion: Completion) { self.core.complete(completion) }

  fn is_closed(&self) -> bool { self.core.is_stopped() }
}

impl<T: 'static> Observable<T> for Subject<T> {
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    self.core.subscribe(subscriber)
  }
}

impl<T> Disposable for Subject<T> {
  fn dispose(&self) { self.core.dispose() }

  fn is_disposed(&self) -> bool { self.core.is_disposed() }
}
