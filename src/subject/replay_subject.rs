use std::{cell::RefCell, collections::VecDeque, fmt, sync::Arc, time::Duration};

use parking_lot::ReentrantMutex;

use super::subject_core::SubjectCore;
use crate::{
  completion::Completion,
  disposable::{BoxDisposable, Disposable},
  error::RxError,
  observable::Observable,
  observer::{Observer, Subscriber},
  scheduler::{FrameProvider, TimeProvider},
};

/// Retention policy of a [`ReplaySubject`].
#[derive(Clone)]
pub enum Window {
  /// Keep everything.
  Unbounded,
  /// Keep the latest `n` values.
  Count(usize),
  /// Keep the values pushed within the trailing `span` of `clock` time.
  Time { span: Duration, clock: Arc<dyn TimeProvider> },
  /// Keep the values pushed within the trailing `span` ticks of `clock`.
  Frames { span: u64, clock: Arc<dyn FrameProvider> },
}

impl fmt::Debug for Window {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Window::Unbounded => f.write_str("Unbounded"),
      Window::Count(n) => f.debug_tuple("Count").field(n).finish(),
      Window::Time { span, .. } => {
        f.debug_struct("Time").field("span", span).finish_non_exhaustive()
      }
      Window::Frames { span, .. } => {
        f.debug_struct("Frames").field("span", span).finish_non_exhaustive()
      }
    }
  }
}

impl Window {
  /// Current position on the window's axis: nanoseconds or ticks.
  fn stamp(&self) -> u64 {
    match self {
      Window::Time { clock, .. } => u64::try_from(clock.now().as_nanos()).unwrap_or(u64::MAX),
      Window::Frames { clock, .. } => clock.frame_count(),
      Window::Unbounded | Window::Count(_) => 0,
    }
  }

  fn span(&self) -> Option<u64> {
    match self {
      Window::Time { span, .. } => Some(u64::try_from(span.as_nanos()).unwrap_or(u64::MAX)),
      Window::Frames { span, .. } => Some(*span),
      Window::Unbounded | Window::Count(_) => None,
    }
  }
}

struct ReplayBuffer<T> {
  window: Window,
  entries: VecDeque<(u64, T)>,
}

impl<T> ReplayBuffer<T> {
  fn push(&mut self, value: T) {
    if let Window::Count(capacity) = self.window {
      if capacity == 0 {
        return;
      }
      if self.entries.len() == capacity {
        self.entries.pop_front();
      }
    }
    let stamp = self.window.stamp();
    self.entries.push_back((stamp, value));
    self.trim();
  }

  /// Evicts entries older than the window; a no-op for count windows.
  fn trim(&mut self) {
    let Some(span) = self.window.span() else { return };
    let now = self.window.stamp();
    while self.entries.front().is_some_and(|(stamp, _)| now.saturating_sub(*stamp) > span) {
      self.entries.pop_front();
    }
  }
}

struct ReplayInner<T> {
  core: Arc<SubjectCore<T>>,
  /// Same role as the behavior subject's lock: push-and-fan-out and
  /// replay-and-attach never interleave.
  buffer: ReentrantMutex<RefCell<ReplayBuffer<T>>>,
}

/// Hub that replays retained history to every new subscriber.
///
/// History is trimmed lazily, on push and on subscribe; no timer runs in
/// the background. After a completion, late subscribers receive the
/// retained history followed by the terminal signal.
///
/// A subscriber pushing into the subject from inside its own replay sees
/// that value in the history of later subscribers, but not live.
pub struct ReplaySubject<T> {
  inner: Arc<ReplayInner<T>>,
}

impl<T> Clone for ReplaySubject<T> {
  fn clone(&self) -> Self { ReplaySubject { inner: self.inner.clone() } }
}

impl<T: Clone> ReplaySubject<T> {
  pub fn new(window: Window) -> Self {
    let capacity = match window {
      Window::Count(n) => n,
      _ => 0,
    };
    ReplaySubject {
      inner: Arc::new(ReplayInner {
        core: Arc::new(SubjectCore::default()),
        buffer: ReentrantMutex::new(RefCell::new(ReplayBuffer {
          window,
          entries: VecDeque::with_capacity(capacity),
        })),
      }),
    }
  }

  pub fn unbounded() -> Self { Self::new(Window::Unbounded) }

  /// Keeps the latest `size` values.
  pub fn with_buffer_size(size: usize) -> Self { Self::new(Window::Count(size)) }

  /// Keeps the values pushed within the trailing `span` of `clock` time.
  pub fn with_window(span: Duration, clock: impl TimeProvider + 'static) -> Self {
    Self::new(Window::Time { span, clock: Arc::new(clock) })
  }

  /// Keeps the values pushed within the trailing `span` ticks of `clock`.
  pub fn with_frame_window(span: u64, clock: impl FrameProvider + 'static) -> Self {
    Self::new(Window::Frames { span, clock: Arc::new(clock) })
  }

  /// The retained values, oldest first.
  pub fn values(&self) -> Vec<T> {
    let buffer = self.inner.buffer.lock();
    let mut buffer = buffer.borrow_mut();
    buffer.trim();
    buffer.entries.iter().map(|(_, v)| v.clone()).collect()
  }

  pub fn observer_count(&self) -> usize { self.inner.core.observer_count() }
}

impl<T: Clone + Send> Observer<T> for ReplaySubject<T> {
  fn on_next(&self, value: T) {
    let buffer = self.inner.buffer.lock();
    if self.inner.core.is_stopped() {
      return;
    }
    buffer.borrow_mut().push(value.clone());
    self.inner.core.next(value);
  }

  fn on_error_resume(&self, err: RxError) { self.inner.core.error_resume(err) }

  fn on_completed(&self, completion: Completion) {
    let _buffer = self.inner.buffer.lock();
    self.inner.core.complete(completion);
  }

  fn is_closed(&self) -> bool { self.inner.core.is_stopped() }
}

impl<T: Clone + Send + 'static> Observable<T> for ReplaySubject<T> {
  fn subscribe_core(&self, subscriber: Subscriber<T>) -> Result<BoxDisposable, RxError> {
    let buffer = self.inner.buffer.lock();
    if self.inner.core.is_disposed() {
      return Err(RxError::AlreadyDisposed);
    }
    let history: Vec<T> = {
      let mut buffer = buffer.borrow_mut();
      buffer.trim();
      buffer.entries.iter().map(|(_, v)| v.clone()).collect()
    };
    for value in history {
      subscriber.on_next(value);
    }
    self.inner.core.subscribe(subscriber)
  }
}

impl<T: Send> Disposable for ReplaySubject<T> {
  fn dispose(&self) {
    self.inner.core.dispose();
    self.inner.buffer.lock().borrow_mut().entries.clear();
  }

  fn is_disposed(&self) -> bool { self.inner.core.is_disposed() }
}
