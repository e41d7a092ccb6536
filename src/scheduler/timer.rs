use std::{
  cmp::Ordering,
  panic::{self, AssertUnwindSafe},
  sync::{Arc, Weak},
  time::Duration,
};

use parking_lot::Mutex;

use super::{Timer, TimerCallback};
use crate::{disposable::Disposable, error::RxError, system::report_unhandled};

/// Lifecycle of one timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
  Stopped,
  /// Armed, waiting for the first fire.
  RunningDueTime,
  /// Recurring.
  RunningPeriod,
  /// A `change` arrived while a fire was in progress; it wins over
  /// whatever the fire was about to decide.
  ChangeRequested,
  Disposed,
}

/// Backend that wakes timers up: a thread, a virtual clock, a frame loop.
///
/// A driver only has to call [`ScheduledFire::run`] once `due` has
/// elapsed. Stale fires (the timer changed or was disposed meanwhile) are
/// filtered by the timer itself, so drivers never cancel entries.
pub trait TimerDriver: Send + Sync {
  fn schedule(&self, due: Duration, fire: ScheduledFire);
}

/// One pending fire of one timer at one version.
///
/// Holds the timer weakly: dropping every handle of a timer disarms it.
pub struct ScheduledFire {
  timer: Weak<TimerCore>,
  version: u64,
}

impl ScheduledFire {
  pub fn run(self) {
    if let Some(core) = self.timer.upgrade() {
      core.fire(self.version);
    }
  }

  /// `true` when running this fire would be a no-op.
  pub fn is_stale(&self) -> bool {
    self.timer.upgrade().map_or(true, |core| !core.is_current(self.version))
  }
}

struct TimerSlot {
  state: TimerState,
  version: u64,
  period: Option<Duration>,
  armed: bool,
  firing: bool,
  /// Version of a fire that was delivered while the callback was running.
  refire: Option<u64>,
}

pub(crate) struct TimerCore {
  callback: TimerCallback,
  driver: Arc<dyn TimerDriver>,
  slot: Mutex<TimerSlot>,
}

impl TimerCore {
  fn is_current(&self, version: u64) -> bool {
    let slot = self.slot.lock();
    slot.state != TimerState::Disposed && slot.version == version
  }

  fn change(self: &Arc<Self>, due: Option<Duration>, period: Option<Duration>) -> bool {
    let version = {
      let mut slot = self.slot.lock();
      if slot.state == TimerState::Disposed {
        return false;
      }
      slot.version = slot.version.wrapping_add(1);
      slot.period = period.filter(|p| !p.is_zero());
      slot.armed = due.is_some();
      slot.state = match (slot.firing, due) {
        (true, _) => TimerState::ChangeRequested,
        (false, Some(_)) => TimerState::RunningDueTime,
        (false, None) => TimerState::Stopped,
      };
      slot.version
    };
    if let Some(due) = due {
      self.driver.schedule(due, ScheduledFire { timer: Arc::downgrade(self), version });
    }
    true
  }

  fn fire(self: &Arc<Self>, version: u64) {
    let mut version = version;
    {
      let mut slot = self.slot.lock();
      if slot.state == TimerState::Disposed || slot.version != version {
        return;
      }
      if slot.firing {
        // Due already; the running fire replays it once its callback returns.
        slot.refire = Some(version);
        return;
      }
      slot.firing = true;
    }

    loop {
      let callback = &self.callback;
      if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback())) {
        report_unhandled(&RxError::from_panic(payload));
      }

      let period = {
        let mut slot = self.slot.lock();
        slot.firing = false;
        let refire = slot.refire.take();
        match slot.state {
          TimerState::Disposed => return,
          TimerState::ChangeRequested => {
            slot.state =
              if slot.armed { TimerState::RunningDueTime } else { TimerState::Stopped };
            match refire {
              Some(due) if due == slot.version => {
                slot.firing = true;
                version = due;
                continue;
              }
              // The change scheduled its own fire, which has not arrived yet.
              _ => return,
            }
          }
          _ => match slot.period {
            Some(period) => {
              slot.state = TimerState::RunningPeriod;
              period
            }
            None => {
              slot.state = TimerState::Stopped;
              slot.armed = false;
              return;
            }
          },
        }
      };
      self.driver.schedule(period, ScheduledFire { timer: Arc::downgrade(self), version });
      return;
    }
  }

  fn dispose(&self) {
    let mut slot = self.slot.lock();
    slot.state = TimerState::Disposed;
    slot.version = slot.version.wrapping_add(1);
  }
}

/// The [`Timer`] every provider of this crate hands out.
///
/// Host adapters implementing [`TimeProvider`](super::TimeProvider) only
/// need a [`TimerDriver`] and can reuse this handle for the state machine.
#[derive(Clone)]
pub struct TimerHandle {
  core: Arc<TimerCore>,
}

impl TimerHandle {
  /// Creates a stopped timer.
  pub fn new(callback: TimerCallback, driver: Arc<dyn TimerDriver>) -> Self {
    TimerHandle {
      core: Arc::new(TimerCore {
        callback,
        driver,
        slot: Mutex::new(TimerSlot {
          state: TimerState::Stopped,
          version: 0,
          period: None,
          armed: false,
          firing: false,
          refire: None,
        }),
      }),
    }
  }

  /// Creates a timer and arms it when `due` is given.
  pub fn start(
    callback: TimerCallback,
    driver: Arc<dyn TimerDriver>,
    due: Option<Duration>,
    period: Option<Duration>,
  ) -> Self {
    let handle = Self::new(callback, driver);
    if due.is_some() {
      handle.core.change(due, period);
    }
    handle
  }

  pub fn state(&self) -> TimerState { self.core.slot.lock().state }
}

impl Timer for TimerHandle {
  fn change(&self, due: Option<Duration>, period: Option<Duration>) -> bool {
    self.core.change(due, period)
  }
}

impl Disposable for TimerHandle {
  fn dispose(&self) { self.core.dispose() }

  fn is_disposed(&self) -> bool { self.state() == TimerState::Disposed }
}

/// Heap entry shared by the time drivers: min-heap on `at`, FIFO on `seq`.
pub(crate) struct Scheduled<K> {
  pub(crate) at: K,
  pub(crate) seq: u64,
  pub(crate) fire: ScheduledFire,
}

impl<K: Ord> PartialEq for Scheduled<K> {
  fn eq(&self, other: &Self) -> bool { self.at == other.at && self.seq == other.seq }
}

impl<K: Ord> Eq for Scheduled<K> {}

impl<K: Ord> PartialOrd for Scheduled<K> {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl<K: Ord> Ord for Scheduled<K> {
  fn cmp(&self, other: &Self) -> Ordering {
    other.at.cmp(&self.at).then_with(|| other.seq.cmp(&self.seq))
  }
}
