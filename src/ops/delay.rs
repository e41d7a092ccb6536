//! Time shifting.
//!
//! Both operators keep a FIFO of pending signals stamped with their due
//! point. A single timer (or frame work item) drains the queue and stays
//! armed only while the queue is non-empty. Values, resumable errors and a
//! successful completion are shifted; a failure completion skips the queue
//! and drops whatever is still pending.

use std::{
  collections::VecDeque,
  sync::{Arc, Weak},
  time::Duration,
};

use parking_lot::Mutex;

use crate::{
  completion::{Completion, Notification},
  disposable::{BoxDisposable, Disposable},
  error::RxError,
  observable::{subscribe_observer, Observable},
  observer::{Observer, Subscriber},
  scheduler::{FrameProvider, TimeProvider, Timer},
};

fn deliver<T>(downstream: &Subscriber<T>, notification: Notification<T>) {
  match notification {
    Notification::Next(value) => downstream.on_next(value),
    Notification::ErrorResume(err) => downstream.on_error_resume(err),
    Notification::Completed(completion) => downstream.on_completed(completion),
  }
}

/// Shifts every signal by a fixed duration of a [`TimeProvider`].
pub struct Delay<S> {
  source: S,
  due: Duration,
  provider: Arc<dyn TimeProvider>,
}

impl<S> Delay<S> {
  pub(crate) fn new(source: S, due: Duration, provider: Arc<dyn TimeProvider>) -> Self {
    Delay { source, due, provider }
  }
}

struct DelayState<T> {
  queue: VecDeque<(Duration, Notification<T>)>,
  armed: bool,
  done: bool,
}

struct DelayCore<T> {
  downstream: Subscriber<T>,
  due: Duration,
  provider: Arc<dyn TimeProvider>,
  timer: Box<dyn Timer>,
  state: Mutex<DelayState<T>>,
}

impl<T: Send + 'static> DelayCore<T> {
  fn new(downstream: Subscriber<T>, due: Duration, provider: Arc<dyn TimeProvider>) -> Arc<Self> {
    Arc::new_cyclic(|weak: &Weak<DelayCore<T>>| {
      let weak = weak.clone();
      let timer = provider.create_timer(
        Arc::new(move || {
          if let Some(core) = weak.upgrade() {
            core.drain();
          }
        }),
        None,
        None,
      );
      DelayCore {
        downstream,
        due,
        provider,
        timer,
        state: Mutex::new(DelayState { queue: VecDeque::new(), armed: false, done: false }),
      }
    })
  }

  fn enqueue(&self, notification: Notification<T>) {
    let at = self.provider.now().saturating_add(self.due);
    let arm = {
      let mut state = self.state.lock();
      if state.done {
        return;
      }
      state.queue.push_back((at, notification));
      !std::mem::replace(&mut state.armed, true)
    };
    if arm {
      self.timer.change(Some(self.due), None);
    }
  }

  /// Emits everything due, then re-arms for the next pending entry.
  fn drain(&self) {
    loop {
      let now = self.provider.now();
      let next = {
        let mut state = self.state.lock();
        match state.queue.front() {
          Some((at, _)) if *at <= now => state.queue.pop_front().map(|(_, n)| n),
          Some((at, _)) => {
            let wait = *at - now;
            drop(state);
            self.timer.change(Some(wait), None);
            return;
          }
          None => {
            state.armed = false;
            return;
          }
        }
      };
      if let Some(notification) = next {
        deliver(&self.downstream, notification);
      }
    }
  }

  fn fail(&self, err: RxError) {
    self.shut_down();
    self.downstream.on_completed(Completion::Failure(err));
  }

  fn shut_down(&self) {
    {
      let mut state = self.state.lock();
      state.done = true;
      state.queue.clear();
    }
    self.timer.dispose();
  }
}

impl<T, S> Observable<T> for Delay<S>
where
  T: Send + 'static,
  S: Observable<T>,
{
  fn subscribe_core(&self, downstream: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    let core = DelayCore::new(downstream, self.due, self.provider.clone());
    let upstream = subscribe_observer(&self.source, DelayObserver { core: core.clone() })?;
    Ok(Box::new(DelaySubscription { upstream, core }))
  }
}

struct DelayObserver<T> {
  core: Arc<DelayCore<T>>,
}

impl<T: Send + 'static> Observer<T> for DelayObserver<T> {
  fn on_next(&self, value: T) { self.core.enqueue(Notification::Next(value)) }

  fn on_error_resume(&self, err: RxError) { self.core.enqueue(Notification::ErrorResume(err)) }

  fn on_completed(&self, completion: Completion) {
    match completion {
      Completion::Success => self.core.enqueue(Notification::Completed(Completion::Success)),
      Completion::Failure(err) => self.core.fail(err),
    }
  }

  fn is_closed(&self) -> bool { self.core.downstream.is_closed() }
}

struct DelaySubscription<T> {
  upstream: BoxDisposable,
  core: Arc<DelayCore<T>>,
}

impl<T: Send + 'static> Disposable for DelaySubscription<T> {
  fn dispose(&self) {
    self.upstream.dispose();
    self.core.shut_down();
  }

  fn is_disposed(&self) -> bool { self.core.timer.is_disposed() }
}

/// Shifts every signal by a number of ticks of a [`FrameProvider`].
///
/// A signal is delivered on the `frames`-th tick after it arrived, counting
/// ticks the same way [`timer_frame`](crate::observable::timer_frame) does.
pub struct DelayFrame<S> {
  source: S,
  frames: u64,
  provider: Arc<dyn FrameProvider>,
}

impl<S> DelayFrame<S> {
  pub(crate) fn new(source: S, frames: u64, provider: Arc<dyn FrameProvider>) -> Self {
    DelayFrame { source, frames: frames.max(1), provider }
  }
}

struct FrameState<T> {
  queue: VecDeque<(u64, Notification<T>)>,
  ticks: u64,
  registered: bool,
  done: bool,
}

struct FrameCore<T> {
  downstream: Subscriber<T>,
  frames: u64,
  provider: Arc<dyn FrameProvider>,
  state: Mutex<FrameState<T>>,
}

impl<T: Send + 'static> FrameCore<T> {
  fn enqueue(self: &Arc<Self>, notification: Notification<T>) {
    let register = {
      let mut state = self.state.lock();
      if state.done {
        return;
      }
      let target = state.ticks + self.frames;
      state.queue.push_back((target, notification));
      !std::mem::replace(&mut state.registered, true)
    };
    if register {
      let weak = Arc::downgrade(self);
      self.provider.register(Box::new(move |_frame: u64| match weak.upgrade() {
        Some(core) => core.tick(),
        None => false,
      }));
    }
  }

  /// Returns whether the work item stays registered.
  fn tick(&self) -> bool {
    let due = {
      let mut state = self.state.lock();
      if state.done {
        state.registered = false;
        return false;
      }
      state.ticks += 1;
      let ticks = state.ticks;
      let mut due = Vec::new();
      while state.queue.front().is_some_and(|(target, _)| *target <= ticks) {
        if let Some((_, notification)) = state.queue.pop_front() {
          due.push(notification);
        }
      }
      due
    };
    for notification in due {
      deliver(&self.downstream, notification);
    }
    let mut state = self.state.lock();
    if state.done || state.queue.is_empty() {
      state.registered = false;
      return false;
    }
    true
  }

  fn shut_down(&self) {
    let mut state = self.state.lock();
    state.done = true;
    state.queue.clear();
  }
}

impl<T, S> Observable<T> for DelayFrame<S>
where
  T: Send + 'static,
  S: Observable<T>,
{
  fn subscribe_core(&self, downstream: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    let core = Arc::new(FrameCore {
      downstream,
      frames: self.frames,
      provider: self.provider.clone(),
      state: Mutex::new(FrameState {
        queue: VecDeque::new(),
        ticks: 0,
        registered: false,
        done: false,
      }),
    });
    let upstream = subscribe_observer(&self.source, FrameObserver { core: core.clone() })?;
    Ok(Box::new(FrameSubscription { upstream, core }))
  }
}

struct FrameObserver<T> {
  core: Arc<FrameCore<T>>,
}

impl<T: Send + 'static> Observer<T> for FrameObserver<T> {
  fn on_next(&self, value: T) { self.core.enqueue(Notification::Next(value)) }

  fn on_error_resume(&self, err: RxError) { self.core.enqueue(Notification::ErrorResume(err)) }

  fn on_completed(&self, completion: Completion) {
    match completion {
      Completion::Success => self.core.enqueue(Notification::Completed(Completion::Success)),
      Completion::Failure(err) => {
        self.core.shut_down();
        self.core.downstream.on_completed(Completion::Failure(err));
      }
    }
  }

  fn is_closed(&self) -> bool { self.core.downstream.is_closed() }
}

struct FrameSubscription<T> {
  upstream: BoxDisposable,
  core: Arc<FrameCore<T>>,
}

impl<T: Send + 'static> Disposable for FrameSubscription<T> {
  fn dispose(&self) {
    self.upstream.dispose();
    self.core.shut_down();
  }

  fn is_disposed(&self) -> bool { self.core.state.lock().done }
}
