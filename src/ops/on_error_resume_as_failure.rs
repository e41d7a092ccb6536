use crate::{
  completion::Completion,
  disposable::BoxDisposable,
  error::RxError,
  observable::{subscribe_observer, Observable},
  observer::{Observer, Subscriber},
};

/// Turns the first resumable error into a failure completion.
pub struct OnErrorResumeAsFailure<S> {
  source: S,
}

impl<S> OnErrorResumeAsFailure<S> {
  pub(crate) fn new(source: S) -> Self { OnErrorResumeAsFailure { source } }
}

impl<T, S> Observable<T> for OnErrorResumeAsFailure<S>
where
  T: 'static,
  S: Observable<T>,
{
  fn subscribe_core(&self, downstream: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    subscribe_observer(&self.source, AsFailureObserver { downstream })
  }
}

struct AsFailureObserver<T> {
  downstream: Subscriber<T>,
}

impl<T> Observer<T> for AsFailureObserver<T> {
  #[inline]
  fn on_next(&self, value: T) { self.downstream.on_next(value) }

  fn on_error_resume(&self, err: RxError) { self.downstream.on_completed(Completion::Failure(err)) }

  #[inline]
  fn on_completed(&self, completion: Completion) { self.downstream.on_completed(completion) }

  #[inline]
  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}
