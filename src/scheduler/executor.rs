//! Executors that run the futures of async operators.
//!
//! Any [`Spawn`] implementation works. The crate ships
//! [`InlineExecutor`], which needs no threads at all, and adapters for the
//! `futures` thread pool and tokio behind cargo features.

use std::sync::{
  atomic::{AtomicU8, Ordering},
  Arc,
};

use futures::{
  future::FutureObj,
  task::{waker_ref, ArcWake, Context, Spawn, SpawnError},
  FutureExt,
};
use parking_lot::Mutex;

/// Executor handle shared by async operators.
pub type SharedExecutor = Arc<dyn Spawn + Send + Sync>;

/// The executor used when none is configured: the `futures` thread pool
/// with the `futures-scheduler` feature, [`InlineExecutor`] otherwise.
pub fn default_executor() -> SharedExecutor {
  #[cfg(feature = "futures-scheduler")]
  {
    use once_cell::sync::Lazy;

    static POOL: Lazy<Option<futures::executor::ThreadPool>> = Lazy::new(|| {
      futures::executor::ThreadPool::builder()
        .name_prefix("rxpush-pool-")
        .create()
        .map_err(|err| tracing::error!(error = %err, "failed to start futures thread pool"))
        .ok()
    });
    if let Some(pool) = POOL.as_ref() {
      return Arc::new(pool.clone());
    }
  }
  Arc::new(InlineExecutor)
}

/// Polls every task on the thread that spawns or wakes it.
///
/// Spawning polls the future immediately; each wake polls it again on the
/// waking thread. Combined with
/// [`FakeTimeProvider`](crate::scheduler::FakeTimeProvider) this makes
/// async operators fully deterministic: advancing the clock runs the
/// continuation before `advance` returns.
///
/// A wake arriving while the task is being polled, including a wake from
/// inside its own poll, schedules one more poll instead of re-entering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

const IDLE: u8 = 0;
const POLLING: u8 = 1;
const REPOLL: u8 = 2;
const COMPLETE: u8 = 3;

struct InlineTask {
  future: Mutex<Option<FutureObj<'static, ()>>>,
  state: AtomicU8,
}

impl InlineTask {
  fn poll_now(self: &Arc<Self>) {
    loop {
      match self.state.compare_exchange(IDLE, POLLING, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => break,
        Err(POLLING) => {
          if self
            .state
            .compare_exchange(POLLING, REPOLL, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
          {
            return;
          }
        }
        Err(_) => return,
      }
    }

    loop {
      let waker = waker_ref(self);
      let mut cx = Context::from_waker(&waker);
      let mut slot = self.future.lock();
      let ready = slot.as_mut().map_or(true, |future| future.poll_unpin(&mut cx).is_ready());
      if ready {
        *slot = None;
        self.state.store(COMPLETE, Ordering::Release);
        return;
      }
      drop(slot);
      match self.state.compare_exchange(POLLING, IDLE, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => return,
        Err(_) => self.state.store(POLLING, Ordering::Release),
      }
    }
  }
}

impl ArcWake for InlineTask {
  fn wake_by_ref(arc_self: &Arc<Self>) { arc_self.poll_now() }
}

impl Spawn for InlineExecutor {
  fn spawn_obj(&self, future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
    let task =
      Arc::new(InlineTask { future: Mutex::new(Some(future)), state: AtomicU8::new(IDLE) });
    task.poll_now();
    Ok(())
  }
}

/// Spawns onto a tokio runtime.
#[cfg(feature = "tokio-scheduler")]
#[derive(Clone)]
pub struct TokioExecutor(pub tokio::runtime::Handle);

#[cfg(feature = "tokio-scheduler")]
impl TokioExecutor {
  /// Handle of the runtime the caller runs in.
  pub fn current() -> Self { TokioExecutor(tokio::runtime::Handle::current()) }
}

#[cfg(feature = "tokio-scheduler")]
impl Spawn for TokioExecutor {
  fn spawn_obj(&self, future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
    drop(self.0.spawn(future));
    Ok(())
  }
}
