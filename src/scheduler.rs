//! Pluggable notions of "time passing".
//!
//! Operators never read a clock or spawn a thread on their own. They are
//! handed either a [`TimeProvider`] (durations, possibly virtual) or a
//! [`FrameProvider`] (discrete ticks), which lets the same operator run
//! against the wall clock, a stepped simulation, or a host loop.
//!
//! | provider                | drives timers by                     |
//! |-------------------------|--------------------------------------|
//! | [`SystemTimeProvider`]  | one process-wide driver thread       |
//! | [`FakeTimeProvider`]    | explicit [`advance`](FakeTimeProvider::advance) |
//! | [`FrameTimeProvider`]   | ticks of a [`FrameProvider`] times a delta |
//!
//! Futures spawned by async operators run on an executor implementing
//! [`futures::task::Spawn`]; see [`InlineExecutor`].

use std::{sync::Arc, time::Duration};

use crate::disposable::Disposable;

mod executor;
mod fake_time;
mod frame_runner;
mod frame_time;
mod sleep;
mod system_time;
mod timer;

pub use executor::{default_executor, InlineExecutor, SharedExecutor};
#[cfg(feature = "tokio-scheduler")]
pub use executor::TokioExecutor;
pub use fake_time::FakeTimeProvider;
pub use frame_runner::{FakeFrameProvider, FrameRunner, TimerFrameProvider};
pub use frame_time::FrameTimeProvider;
pub use sleep::{sleep, timeout, Sleep, Timeout};
pub use system_time::SystemTimeProvider;
pub use timer::{ScheduledFire, TimerDriver, TimerHandle, TimerState};

/// Callback invoked each time a timer fires.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// Source of logical time and timers.
pub trait TimeProvider: Send + Sync {
  /// Time elapsed since the provider's origin.
  fn now(&self) -> Duration;

  /// Creates a timer firing `callback` after `due`, then every `period`.
  ///
  /// `due == None` creates the timer stopped; it stays silent until
  /// [`Timer::change`] arms it. A zero or absent `period` fires once.
  fn create_timer(
    &self,
    callback: TimerCallback,
    due: Option<Duration>,
    period: Option<Duration>,
  ) -> Box<dyn Timer>;
}

impl<P: TimeProvider + ?Sized> TimeProvider for Arc<P> {
  #[inline]
  fn now(&self) -> Duration { (**self).now() }

  #[inline]
  fn create_timer(
    &self,
    callback: TimerCallback,
    due: Option<Duration>,
    period: Option<Duration>,
  ) -> Box<dyn Timer> {
    (**self).create_timer(callback, due, period)
  }
}

/// A cancellable, reschedulable timer.
pub trait Timer: Disposable {
  /// Re-arms the timer. A change issued while the timer is firing,
  /// including from its own callback, takes precedence over the schedule
  /// the fire was about to continue with.
  ///
  /// Returns `false` once the timer is disposed.
  fn change(&self, due: Option<Duration>, period: Option<Duration>) -> bool;

  /// Same as changing the due time to "never".
  fn stop(&self) -> bool { self.change(None, None) }
}

/// Source of discrete ticks.
pub trait FrameProvider: Send + Sync {
  /// Number of ticks run so far.
  fn frame_count(&self) -> u64;

  /// Runs `item` once per tick, starting with the next one, until it
  /// returns `false`.
  fn register(&self, item: Box<dyn FrameWorkItem>);
}

impl<P: FrameProvider + ?Sized> FrameProvider for Arc<P> {
  #[inline]
  fn frame_count(&self) -> u64 { (**self).frame_count() }

  #[inline]
  fn register(&self, item: Box<dyn FrameWorkItem>) { (**self).register(item) }
}

/// Per-tick work registered on a [`FrameProvider`].
pub trait FrameWorkItem: Send {
  /// Returns `false` to be deregistered.
  fn move_next(&mut self, frame_count: u64) -> bool;
}

impl<F: FnMut(u64) -> bool + Send> FrameWorkItem for F {
  #[inline]
  fn move_next(&mut self, frame_count: u64) -> bool { self(frame_count) }
}
