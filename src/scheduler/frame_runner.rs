use std::{
  panic::{self, AssertUnwindSafe},
  sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
  },
  time::Duration,
};

use parking_lot::Mutex;

use super::{FrameProvider, FrameWorkItem, TimeProvider, Timer};
use crate::{
  disposable::Disposable, error::RxError, registry::CompactList, system::report_unhandled,
};

type WorkSlot = Mutex<Box<dyn FrameWorkItem>>;

/// Runs registered work items once per tick.
///
/// Host adapters call [`run`](Self::run) from their frame callback. Items
/// registered during a tick start with the next tick. A panicking item is
/// reported to the unhandled sink and deregistered.
pub struct FrameRunner {
  frame: AtomicU64,
  items: CompactList<WorkSlot>,
}

impl Default for FrameRunner {
  fn default() -> Self { FrameRunner { frame: AtomicU64::new(0), items: CompactList::new() } }
}

impl FrameRunner {
  pub fn new() -> Self { Self::default() }

  /// Runs one tick.
  pub fn run(&self) {
    let frame = self.frame.load(Ordering::Acquire);
    for item in self.items.snapshot().to_vec() {
      // Reentrant run from inside this very item: skip it this time.
      let Some(mut work) = item.try_lock() else { continue };
      let keep = match panic::catch_unwind(AssertUnwindSafe(|| work.move_next(frame))) {
        Ok(keep) => keep,
        Err(payload) => {
          report_unhandled(&RxError::from_panic(payload));
          false
        }
      };
      drop(work);
      if !keep {
        self.items.remove(&item);
      }
    }
    self.frame.fetch_add(1, Ordering::AcqRel);
  }

  /// Number of registered items.
  pub fn item_count(&self) -> usize { self.items.count() }

  /// Drops every item; later registrations are ignored.
  pub fn clear(&self) {
    tracing::debug!(items = self.items.count(), "frame runner cleared");
    self.items.dispose();
  }
}

impl FrameProvider for FrameRunner {
  fn frame_count(&self) -> u64 { self.frame.load(Ordering::Acquire) }

  fn register(&self, item: Box<dyn FrameWorkItem>) {
    if self.items.add(Arc::new(Mutex::new(item))).is_err() {
      tracing::debug!("frame item registered after the runner was cleared");
    }
  }
}

/// Frame provider stepped by hand.
#[derive(Clone, Default)]
pub struct FakeFrameProvider {
  runner: Arc<FrameRunner>,
}

impl FakeFrameProvider {
  pub fn new() -> Self { Self::default() }

  /// Runs one tick.
  pub fn advance(&self) { self.runner.run() }

  /// Runs `frames` ticks.
  pub fn advance_by(&self, frames: u64) {
    for _ in 0..frames {
      self.runner.run();
    }
  }

  pub fn item_count(&self) -> usize { self.runner.item_count() }
}

impl FrameProvider for FakeFrameProvider {
  fn frame_count(&self) -> u64 { self.runner.frame_count() }

  fn register(&self, item: Box<dyn FrameWorkItem>) { self.runner.register(item) }
}

/// Frame provider ticking on a periodic timer of a [`TimeProvider`].
///
/// Stops ticking once disposed.
pub struct TimerFrameProvider {
  runner: Arc<FrameRunner>,
  timer: Box<dyn Timer>,
}

impl TimerFrameProvider {
  pub fn new(time: &dyn TimeProvider, interval: Duration) -> Self {
    let runner = Arc::new(FrameRunner::new());
    let tick = runner.clone();
    let timer = time.create_timer(Arc::new(move || tick.run()), Some(interval), Some(interval));
    TimerFrameProvider { runner, timer }
  }
}

impl FrameProvider for TimerFrameProvider {
  fn frame_count(&self) -> u64 { self.runner.frame_count() }

  fn register(&self, item: Box<dyn FrameWorkItem>) { self.runner.register(item) }
}

impl Disposable for TimerFrameProvider {
  fn dispose(&self) {
    self.timer.dispose();
    self.runner.clear();
  }

  fn is_disposed(&self) -> bool { self.timer.is_disposed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scheduler::FakeTimeProvider;

  #[rxpush_macro::test]
  fn items_run_until_they_return_false() {
    let frames = FakeFrameProvider::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let c_seen = seen.clone();
    frames.register(Box::new(move |frame: u64| {
      c_seen.lock().push(frame);
      frame < 2
    }));

    frames.advance_by(5);
    assert_eq!(*seen.lock(), vec![0, 1, 2]);
    assert_eq!(frames.frame_count(), 5);
    assert_eq!(frames.item_count(), 0);
  }

  #[rxpush_macro::test]
  fn item_registered_during_a_tick_starts_next_tick() {
    let frames = FakeFrameProvider::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let c_frames = frames.clone();
    let c_seen = seen.clone();
    frames.register(Box::new(move |_: u64| {
      let inner_seen = c_seen.clone();
      c_frames.register(Box::new(move |frame: u64| {
        inner_seen.lock().push(frame);
        false
      }));
      false
    }));

    frames.advance();
    assert!(seen.lock().is_empty());
    frames.advance();
    assert_eq!(*seen.lock(), vec![1]);
  }

  #[rxpush_macro::test]
  fn panicking_item_is_deregistered() {
    use crate::system::test_support::capture_unhandled;

    let frames = FakeFrameProvider::new();
    let (_, errors) = capture_unhandled("frame-panic", || {
      frames.register(Box::new(|_: u64| -> bool { panic!("frame-panic") }));
      frames.advance_by(3);
    });
    assert_eq!(errors.len(), 1);
    assert_eq!(frames.item_count(), 0);
  }

  #[rxpush_macro::test]
  fn timer_driven_ticks() {
    let clock = FakeTimeProvider::new();
    let frames = TimerFrameProvider::new(&clock, Duration::from_millis(16));
    let count = Arc::new(AtomicU64::new(0));
    let c_count = count.clone();
    frames.register(Box::new(move |_: u64| {
      c_count.fetch_add(1, Ordering::SeqCst);
      true
    }));

    clock.advance(Duration::from_millis(16 * 4));
    assert_eq!(frames.frame_count(), 4);
    assert_eq!(count.load(Ordering::SeqCst), 4);

    frames.dispose();
    clock.advance(Duration::from_millis(100));
    assert_eq!(frames.frame_count(), 4);
  }
}
