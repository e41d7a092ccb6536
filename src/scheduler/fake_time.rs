//! Virtual clock for deterministic tests of time-based operators.
//!
//! Time only moves when [`FakeTimeProvider::advance`] is called. Every timer
//! due within the advanced span fires on the calling thread, in due order,
//! with [`now`](TimeProvider::now) reporting the fire's own due time while
//! its callback runs.
//!
//! ```rust
//! use std::{sync::Arc, time::Duration};
//! use rxpush::prelude::*;
//!
//! let clock = FakeTimeProvider::new();
//! let callback = Arc::new(|| println!("tick"));
//! let timer = clock.create_timer(callback, Some(Duration::from_secs(1)), None);
//! clock.advance(Duration::from_secs(1)); // prints "tick"
//! timer.dispose();
//! ```

use std::{collections::BinaryHeap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use super::{
  timer::{Scheduled, ScheduledFire, TimerDriver, TimerHandle},
  TimeProvider, Timer, TimerCallback,
};

struct ClockState {
  now: Duration,
  heap: BinaryHeap<Scheduled<Duration>>,
  next_seq: u64,
}

struct FakeClock {
  state: Mutex<ClockState>,
}

impl TimerDriver for FakeClock {
  fn schedule(&self, due: Duration, fire: ScheduledFire) {
    let mut state = self.state.lock();
    // Past the end of representable time: never due.
    let Some(at) = state.now.checked_add(due) else { return };
    let seq = state.next_seq;
    state.next_seq += 1;
    state.heap.push(Scheduled { at, seq, fire });
  }
}

/// Time provider whose clock moves only on request.
///
/// Clones share the same clock.
#[derive(Clone)]
pub struct FakeTimeProvider {
  clock: Arc<FakeClock>,
}

impl Default for FakeTimeProvider {
  fn default() -> Self {
    FakeTimeProvider {
      clock: Arc::new(FakeClock {
        state: Mutex::new(ClockState { now: Duration::ZERO, heap: BinaryHeap::new(), next_seq: 0 }),
      }),
    }
  }
}

impl FakeTimeProvider {
  pub fn new() -> Self { Self::default() }

  /// Moves the clock forward by `by`, firing every timer that falls due.
  ///
  /// Timers armed by a callback with a due time inside the span fire
  /// within the same call.
  pub fn advance(&self, by: Duration) {
    let target = self.clock.state.lock().now.saturating_add(by);
    loop {
      let fire = {
        let mut state = self.clock.state.lock();
        match state.heap.peek() {
          Some(top) if top.at <= target => {
            let at = top.at;
            state.now = state.now.max(at);
            state.heap.pop().map(|entry| entry.fire)
          }
          _ => {
            state.now = target;
            None
          }
        }
      };
      match fire {
        Some(fire) => fire.run(),
        None => break,
      }
    }
  }

  /// Fires everything due at the current instant without moving the clock.
  pub fn flush(&self) { self.advance(Duration::ZERO) }

  /// Entries waiting in the queue, stale ones included.
  pub fn pending_count(&self) -> usize { self.clock.state.lock().heap.len() }
}

impl TimeProvider for FakeTimeProvider {
  fn now(&self) -> Duration { self.clock.state.lock().now }

  fn create_timer(
    &self,
    callback: TimerCallback,
    due: Option<Duration>,
    period: Option<Duration>,
  ) -> Box<dyn Timer> {
    let driver: Arc<dyn TimerDriver> = self.clock.clone();
    Box::new(TimerHandle::start(callback, driver, due, period))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::disposable::Disposable;

  fn recording(
    clock: &FakeTimeProvider, log: &Arc<Mutex<Vec<(u64, Duration)>>>, id: u64,
  ) -> TimerCallback {
    let clock = clock.clone();
    let log = log.clone();
    Arc::new(move || log.lock().push((id, clock.now())))
  }

  #[rxpush_macro::test]
  fn fires_in_due_order_with_virtual_now() {
    let clock = FakeTimeProvider::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let _a = clock.create_timer(recording(&clock, &log, 1), Some(Duration::from_secs(3)), None);
    let _b = clock.create_timer(recording(&clock, &log, 2), Some(Duration::from_secs(1)), None);
    let _c = clock.create_timer(recording(&clock, &log, 3), Some(Duration::from_secs(1)), None);

    clock.advance(Duration::from_secs(2));
    assert_eq!(*log.lock(), vec![(2, Duration::from_secs(1)), (3, Duration::from_secs(1))]);
    assert_eq!(clock.now(), Duration::from_secs(2));

    clock.advance(Duration::from_secs(5));
    assert_eq!(log.lock().last(), Some(&(1, Duration::from_secs(3))));
    assert_eq!(clock.now(), Duration::from_secs(7));
  }

  #[rxpush_macro::test]
  fn periodic_timer_fires_every_period_within_one_advance() {
    let clock = FakeTimeProvider::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let timer = clock.create_timer(
      recording(&clock, &log, 0),
      Some(Duration::from_secs(1)),
      Some(Duration::from_secs(2)),
    );
    clock.advance(Duration::from_secs(6));
    let at: Vec<_> = log.lock().iter().map(|(_, t)| t.as_secs()).collect();
    assert_eq!(at, vec![1, 3, 5]);

    timer.dispose();
    clock.advance(Duration::from_secs(10));
    assert_eq!(log.lock().len(), 3);
  }

  #[rxpush_macro::test]
  fn change_from_own_callback_takes_effect() {
    let clock = FakeTimeProvider::new();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let holder: Arc<Mutex<Option<Box<dyn Timer>>>> = Arc::new(Mutex::new(None));

    let c_clock = clock.clone();
    let c_hits = hits.clone();
    let c_holder = holder.clone();
    let timer = clock.create_timer(
      Arc::new(move || {
        c_hits.lock().push(c_clock.now().as_secs());
        if c_hits.lock().len() == 1 {
          if let Some(timer) = c_holder.lock().as_ref() {
            // Period was 1s; the new schedule says once more, 10s later.
            timer.change(Some(Duration::from_secs(10)), None);
          }
        }
      }),
      Some(Duration::from_secs(1)),
      Some(Duration::from_secs(1)),
    );
    *holder.lock() = Some(timer);

    clock.advance(Duration::from_secs(30));
    assert_eq!(*hits.lock(), vec![1, 11]);
    holder.lock().take();
  }

  #[rxpush_macro::test]
  fn due_time_past_the_end_of_time_never_fires() {
    let clock = FakeTimeProvider::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    clock.advance(Duration::from_secs(1));
    let timer = clock.create_timer(recording(&clock, &log, 0), Some(Duration::MAX), None);
    assert_eq!(clock.pending_count(), 0);

    clock.advance(Duration::MAX);
    assert!(log.lock().is_empty());
    assert!(timer.change(Some(Duration::ZERO), None));
    clock.flush();
    assert_eq!(log.lock().len(), 1);
  }
}
