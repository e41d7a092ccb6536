use std::{sync::Arc, time::Duration};

use super::{
  timer::{ScheduledFire, TimerDriver, TimerHandle},
  FrameProvider, FrameWorkItem, TimeProvider, Timer, TimerCallback,
};

/// Time provider whose clock advances by a fixed delta on every tick of a
/// [`FrameProvider`].
///
/// Time-based operators driven by this provider run in lockstep with the
/// frame loop: a timer due in 50ms with a 16ms delta fires on the fourth
/// tick after it was armed.
#[derive(Clone)]
pub struct FrameTimeProvider {
  driver: Arc<FrameDriver>,
}

struct FrameDriver {
  frames: Arc<dyn FrameProvider>,
  delta: Duration,
}

impl FrameTimeProvider {
  pub fn new(frames: Arc<dyn FrameProvider>, delta_per_tick: Duration) -> Self {
    FrameTimeProvider { driver: Arc::new(FrameDriver { frames, delta: delta_per_tick }) }
  }

  pub fn delta_per_tick(&self) -> Duration { self.driver.delta }
}

impl TimeProvider for FrameTimeProvider {
  fn now(&self) -> Duration {
    let ticks = self.driver.frames.frame_count();
    self.driver.delta.saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX))
  }

  fn create_timer(
    &self,
    callback: TimerCallback,
    due: Option<Duration>,
    period: Option<Duration>,
  ) -> Box<dyn Timer> {
    let driver: Arc<dyn TimerDriver> = self.driver.clone();
    Box::new(TimerHandle::start(callback, driver, due, period))
  }
}

impl TimerDriver for FrameDriver {
  fn schedule(&self, due: Duration, fire: ScheduledFire) {
    self.frames.register(Box::new(DueAfterTicks {
      due,
      elapsed: Duration::ZERO,
      delta: self.delta,
      fire: Some(fire),
    }));
  }
}

struct DueAfterTicks {
  due: Duration,
  elapsed: Duration,
  delta: Duration,
  fire: Option<ScheduledFire>,
}

impl FrameWorkItem for DueAfterTicks {
  fn move_next(&mut self, _frame_count: u64) -> bool {
    if self.fire.as_ref().map_or(true, ScheduledFire::is_stale) {
      return false;
    }
    self.elapsed = self.elapsed.saturating_add(self.delta);
    if self.elapsed < self.due {
      return true;
    }
    if let Some(fire) = self.fire.take() {
      fire.run();
    }
    false
  }
}
