use std::{
  sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
  },
  time::Duration,
};

use super::Observable;
use crate::{
  completion::Completion,
  disposable::{BoxDisposable, BooleanDisposable, Disposable},
  error::RxError,
  observer::{Observer, Subscriber},
  scheduler::{FrameProvider, TimeProvider},
};

/// Emits `()` once after `due`, then completes.
#[derive(Clone)]
pub struct TimerObservable {
  due: Duration,
  provider: Arc<dyn TimeProvider>,
}

pub fn timer(due: Duration, provider: impl TimeProvider + 'static) -> TimerObservable {
  TimerObservable { due, provider: Arc::new(provider) }
}

impl Observable<()> for TimerObservable {
  fn subscribe_core(&self, subscriber: Subscriber<()>) -> Result<BoxDisposable, RxError> {
    let timer = self.provider.create_timer(
      Arc::new(move || {
        subscriber.on_next(());
        subscriber.on_completed(Completion::Success);
      }),
      Some(self.due),
      None,
    );
    Ok(Box::new(timer))
  }
}

/// Emits `0, 1, 2, ...` every `period`. Never completes.
#[derive(Clone)]
pub struct Interval {
  period: Duration,
  provider: Arc<dyn TimeProvider>,
}

pub fn interval(period: Duration, provider: impl TimeProvider + 'static) -> Interval {
  Interval { period, provider: Arc::new(provider) }
}

impl Observable<u64> for Interval {
  fn subscribe_core(&self, subscriber: Subscriber<u64>) -> Result<BoxDisposable, RxError> {
    let count = AtomicU64::new(0);
    let timer = self.provider.create_timer(
      Arc::new(move || subscriber.on_next(count.fetch_add(1, Ordering::Relaxed))),
      Some(self.period),
      Some(self.period),
    );
    Ok(Box::new(timer))
  }
}

/// Emits `()` on the `frames`-th tick after subscribing (the first tick for
/// zero), then completes.
#[derive(Clone)]
pub struct TimerFrame {
  frames: u64,
  provider: Arc<dyn FrameProvider>,
}

pub fn timer_frame(frames: u64, provider: impl FrameProvider + 'static) -> TimerFrame {
  TimerFrame { frames, provider: Arc::new(provider) }
}

impl Observable<()> for TimerFrame {
  fn subscribe_core(&self, subscriber: Subscriber<()>) -> Result<BoxDisposable, RxError> {
    let cancel = Arc::new(BooleanDisposable::new());
    let cancelled = cancel.clone();
    let due = self.frames;
    let mut elapsed = 0;
    self.provider.register(Box::new(move |_frame: u64| {
      if cancelled.is_disposed() || subscriber.is_closed() {
        return false;
      }
      elapsed += 1;
      if elapsed < due {
        return true;
      }
      subscriber.on_next(());
      subscriber.on_completed(Completion::Success);
      false
    }));
    Ok(Box::new(cancel))
  }
}

/// Emits `0, 1, 2, ...` every `period` ticks (at least one). Never
/// completes.
#[derive(Clone)]
pub struct IntervalFrame {
  period: u64,
  provider: Arc<dyn FrameProvider>,
}

pub fn interval_frame(period: u64, provider: impl FrameProvider + 'static) -> IntervalFrame {
  IntervalFrame { period: period.max(1), provider: Arc::new(provider) }
}

impl Observable<u64> for IntervalFrame {
  fn subscribe_core(&self, subscriber: Subscriber<u64>) -> Result<BoxDisposable, RxError> {
    let cancel = Arc::new(BooleanDisposable::new());
    let cancelled = cancel.clone();
    let period = self.period;
    let mut elapsed = 0;
    let mut count = 0;
    self.provider.register(Box::new(move |_frame: u64| {
      if cancelled.is_disposed() || subscriber.is_closed() {
        return false;
      }
      elapsed += 1;
      if elapsed == period {
        elapsed = 0;
        subscriber.on_next(count);
        count += 1;
      }
      true
    }));
    Ok(Box::new(cancel))
  }
}
