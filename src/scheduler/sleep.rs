use std::{
  future::Future,
  pin::Pin,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
  task::{Context, Poll, Waker},
  time::Duration,
};

use parking_lot::Mutex;
use pin_project_lite::pin_project;

use super::{TimeProvider, Timer};
use crate::{disposable::Disposable, error::RxError};

struct SleepShared {
  elapsed: AtomicBool,
  waker: Mutex<Option<Waker>>,
}

/// Future completing once a provider timer fires.
///
/// Dropping it disposes the timer.
pub struct Sleep {
  shared: Arc<SleepShared>,
  timer: Box<dyn Timer>,
}

/// Sleeps for `duration` as measured by `provider`.
pub fn sleep(provider: &dyn TimeProvider, duration: Duration) -> Sleep {
  let shared = Arc::new(SleepShared { elapsed: AtomicBool::new(false), waker: Mutex::new(None) });
  let on_fire = shared.clone();
  let timer = provider.create_timer(
    Arc::new(move || {
      on_fire.elapsed.store(true, Ordering::Release);
      let waker = on_fire.waker.lock().take();
      if let Some(waker) = waker {
        waker.wake();
      }
    }),
    Some(duration),
    None,
  );
  Sleep { shared, timer }
}

impl Future for Sleep {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    if self.shared.elapsed.load(Ordering::Acquire) {
      return Poll::Ready(());
    }
    *self.shared.waker.lock() = Some(cx.waker().clone());
    // The timer may have fired between the check and storing the waker.
    if self.shared.elapsed.load(Ordering::Acquire) {
      Poll::Ready(())
    } else {
      Poll::Pending
    }
  }
}

impl Drop for Sleep {
  fn drop(&mut self) { self.timer.dispose(); }
}

pin_project! {
  /// Future returned by [`timeout`].
  pub struct Timeout<F> {
    #[pin]
    future: F,
    deadline: Sleep,
  }
}

/// Fails with [`RxError::Timeout`] unless `future` finishes within
/// `duration` of `provider` time.
pub fn timeout<F: Future>(
  provider: &dyn TimeProvider, duration: Duration, future: F,
) -> Timeout<F> {
  Timeout { future, deadline: sleep(provider, duration) }
}

impl<F: Future> Future for Timeout<F> {
  type Output = Result<F::Output, RxError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.project();
    if let Poll::Ready(output) = this.future.poll(cx) {
      return Poll::Ready(Ok(output));
    }
    match Pin::new(this.deadline).poll(cx) {
      Poll::Ready(()) => Poll::Ready(Err(RxError::Timeout)),
      Poll::Pending => Poll::Pending,
    }
  }
}
