use std::{
  collections::BinaryHeap,
  sync::Arc,
  thread,
  time::{Duration, Instant},
};

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};

use super::{
  timer::{Scheduled, ScheduledFire, TimerDriver, TimerHandle},
  TimeProvider, Timer, TimerCallback,
};

static ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

static DRIVER: Lazy<Arc<ThreadDriver>> = Lazy::new(ThreadDriver::spawn);

/// Wall-clock provider.
///
/// All timers share one lazily started driver thread; callbacks run on that
/// thread, one at a time, so a slow callback delays the others.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
  fn now(&self) -> Duration { ORIGIN.elapsed() }

  fn create_timer(
    &self,
    callback: TimerCallback,
    due: Option<Duration>,
    period: Option<Duration>,
  ) -> Box<dyn Timer> {
    let driver: Arc<dyn TimerDriver> = DRIVER.clone();
    Box::new(TimerHandle::start(callback, driver, due, period))
  }
}

struct DriverQueue {
  heap: BinaryHeap<Scheduled<Instant>>,
  next_seq: u64,
}

struct ThreadDriver {
  queue: Mutex<DriverQueue>,
  wakeup: Condvar,
}

impl ThreadDriver {
  fn spawn() -> Arc<Self> {
    let driver = Arc::new(ThreadDriver {
      queue: Mutex::new(DriverQueue { heap: BinaryHeap::new(), next_seq: 0 }),
      wakeup: Condvar::new(),
    });
    let worker = driver.clone();
    match thread::Builder::new().name("rxpush-timer".into()).spawn(move || worker.run()) {
      Ok(_) => tracing::debug!("timer driver thread started"),
      Err(err) => tracing::error!(error = %err, "failed to start timer driver thread"),
    }
    driver
  }

  fn run(&self) {
    loop {
      let due = self.next_due();
      for fire in due {
        fire.run();
      }
    }
  }

  /// Blocks until at least one entry is due and pops every due entry.
  fn next_due(&self) -> Vec<ScheduledFire> {
    let mut queue = self.queue.lock();
    loop {
      let now = Instant::now();
      match queue.heap.peek().map(|top| top.at) {
        Some(at) if at <= now => {
          let mut due = Vec::new();
          while queue.heap.peek().is_some_and(|top| top.at <= now) {
            if let Some(entry) = queue.heap.pop() {
              due.push(entry.fire);
            }
          }
          return due;
        }
        Some(at) => {
          self.wakeup.wait_until(&mut queue, at);
        }
        None => self.wakeup.wait(&mut queue),
      }
    }
  }
}

impl TimerDriver for ThreadDriver {
  fn schedule(&self, due: Duration, fire: ScheduledFire) {
    let Some(at) = Instant::now().checked_add(due) else { return };
    let mut queue = self.queue.lock();
    let seq = queue.next_seq;
    queue.next_seq += 1;
    let is_earliest = queue.heap.peek().map_or(true, |top| at < top.at);
    queue.heap.push(Scheduled { at, seq, fire });
    if is_earliest {
      self.wakeup.notify_one();
    }
  }
}
