//! Asynchronous projection with an overlap policy.
//!
//! [`SelectAwait`] runs an async selector for each source value. The source
//! never waits for a projection: `on_next` only decides, under the
//! operator's lock, whether the value starts now, waits, replaces another
//! value or is ignored, and then hands any started future to the
//! configured executor.
//!
//! # Overlap policies
//!
//! | policy                | value arriving while busy            | output order    |
//! |-----------------------|--------------------------------------|-----------------|
//! | `Sequential`          | queued                               | arrival         |
//! | `Drop`                | ignored                              | arrival         |
//! | `Switch`              | aborts the running one, starts       | latest only     |
//! | `Parallel`            | starts (or waits for a free slot)    | completion      |
//! | `SequentialParallel`  | starts (or waits for a free slot)    | arrival         |
//! | `ThrottleFirstLast`   | remembered, replacing older ones     | arrival         |
//!
//! A successful source completion is forwarded once every started or
//! waiting projection has settled, or immediately when
//! [`AwaitOptions::cancel_on_completed`] is set. A failure completion is
//! forwarded immediately and aborts the outstanding work. Disposing the
//! subscription aborts every projection.

use std::{
  collections::{BTreeMap, HashMap, VecDeque},
  fmt,
  future::Future,
  marker::PhantomData,
  panic::{self, AssertUnwindSafe},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use futures::{
  future::{AbortHandle, AbortRegistration, Abortable, BoxFuture},
  task::{Spawn, SpawnExt},
  FutureExt,
};
use parking_lot::{Mutex, ReentrantMutex};
use smallvec::SmallVec;

use crate::{
  completion::Completion,
  disposable::{BoxDisposable, Disposable},
  error::RxError,
  observable::{subscribe_observer, Observable},
  observer::{Observer, Subscriber},
  scheduler::{default_executor, SharedExecutor},
};

/// What to do with a value that arrives while a projection is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AwaitOperation {
  /// Queue it; run one projection at a time.
  #[default]
  Sequential,
  /// Ignore it.
  Drop,
  /// Abort the running projection and start this one.
  Switch,
  /// Start it right away; results in completion order.
  Parallel,
  /// Start it right away; results in arrival order.
  SequentialParallel,
  /// Keep only the latest such value and start it when the running one
  /// settles.
  ThrottleFirstLast,
}

/// Configuration of [`SelectAwait`].
#[derive(Clone)]
pub struct AwaitOptions {
  operation: AwaitOperation,
  cancel_on_completed: bool,
  max_concurrent: Option<usize>,
  executor: SharedExecutor,
}

impl AwaitOptions {
  pub fn new(operation: AwaitOperation) -> Self {
    AwaitOptions {
      operation,
      cancel_on_completed: false,
      max_concurrent: None,
      executor: default_executor(),
    }
  }

  /// Abort outstanding projections instead of awaiting them when the
  /// source completes successfully.
  pub fn cancel_on_completed(mut self, cancel: bool) -> Self {
    self.cancel_on_completed = cancel;
    self
  }

  /// Caps the number of simultaneous projections of `Parallel` and
  /// `SequentialParallel`; excess values wait in arrival order. Ignored by
  /// the other policies, which never run more than one.
  pub fn max_concurrent(mut self, limit: usize) -> Self {
    self.max_concurrent = Some(limit.max(1));
    self
  }

  /// Executor the projection futures are spawned on.
  pub fn executor(mut self, executor: impl Spawn + Send + Sync + 'static) -> Self {
    self.executor = Arc::new(executor);
    self
  }

  pub fn operation(&self) -> AwaitOperation { self.operation }

  fn limit(&self) -> usize {
    match self.operation {
      AwaitOperation::Parallel | AwaitOperation::SequentialParallel => {
        self.max_concurrent.unwrap_or(usize::MAX)
      }
      _ => 1,
    }
  }
}

impl Default for AwaitOptions {
  fn default() -> Self { AwaitOptions::new(AwaitOperation::Sequential) }
}

impl From<AwaitOperation> for AwaitOptions {
  fn from(operation: AwaitOperation) -> Self { AwaitOptions::new(operation) }
}

impl fmt::Debug for AwaitOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AwaitOptions")
      .field("operation", &self.operation)
      .field("cancel_on_completed", &self.cancel_on_completed)
      .field("max_concurrent", &self.max_concurrent)
      .finish_non_exhaustive()
  }
}

/// Projects values through an async selector; see the module docs.
pub struct SelectAwait<S, F, T> {
  source: S,
  options: AwaitOptions,
  selector: Arc<F>,
  _marker: PhantomData<fn(T)>,
}

impl<S, F, T> SelectAwait<S, F, T> {
  pub(crate) fn new(source: S, options: AwaitOptions, selector: F) -> Self {
    SelectAwait { source, options, selector: Arc::new(selector), _marker: PhantomData }
  }
}

type Selector<T, U> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<U, RxError>> + Send + Sync>;

impl<T, U, S, F, Fut> Observable<U> for SelectAwait<S, F, T>
where
  T: Send + 'static,
  U: Send + 'static,
  S: Observable<T>,
  F: Fn(T) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<U, RxError>> + Send + 'static,
{
  fn subscribe_core(&self, downstream: Subscriber<U>) -> Result<BoxDisposable, RxError> {
    let selector = self.selector.clone();
    let selector: Selector<T, U> = Arc::new(move |value: T| selector(value).boxed());
    let core = Arc::new(AwaitCore {
      downstream,
      selector,
      options: self.options.clone(),
      state: Mutex::new(AwaitState::default()),
      emit_gate: ReentrantMutex::new(()),
    });
    let upstream = subscribe_observer(&self.source, AwaitObserver { core: core.clone() })?;
    Ok(Box::new(AwaitSubscription { upstream, core, disposed: AtomicBool::new(false) }))
  }
}

/// A projection admitted to run: its handle is already in `running`.
struct Start<T> {
  seq: u64,
  value: T,
  registration: AbortRegistration,
}

type Aborts = SmallVec<[AbortHandle; 2]>;

struct AwaitState<T, U> {
  next_seq: u64,
  running: HashMap<u64, AbortHandle>,
  queue: VecDeque<(u64, T)>,
  latest: Option<(u64, T)>,
  /// Settled results waiting for an earlier one (`SequentialParallel`).
  ready: BTreeMap<u64, Result<U, RxError>>,
  next_emit: u64,
  source_done: bool,
  terminated: bool,
}

impl<T, U> Default for AwaitState<T, U> {
  fn default() -> Self {
    AwaitState {
      next_seq: 0,
      running: HashMap::new(),
      queue: VecDeque::new(),
      latest: None,
      ready: BTreeMap::new(),
      next_emit: 0,
      source_done: false,
      terminated: false,
    }
  }
}

impl<T, U> AwaitState<T, U> {
  fn admit(&mut self, seq: u64, value: T) -> Start<T> {
    let (handle, registration) = AbortHandle::new_pair();
    self.running.insert(seq, handle);
    Start { seq, value, registration }
  }

  fn is_idle(&self) -> bool {
    self.running.is_empty()
      && self.queue.is_empty()
      && self.latest.is_none()
      && self.ready.is_empty()
  }

  /// Ends the operator and returns the handles of every running projection.
  fn terminate(&mut self) -> Aborts {
    self.terminated = true;
    self.queue.clear();
    self.latest = None;
    self.ready.clear();
    self.running.drain().map(|(_, handle)| handle).collect()
  }
}

struct AwaitCore<T, U> {
  downstream: Subscriber<U>,
  selector: Selector<T, U>,
  options: AwaitOptions,
  state: Mutex<AwaitState<T, U>>,
  /// Serializes delivery to `downstream`; reentrant because a projection
  /// can settle inline while a delivery is in progress on the same thread.
  emit_gate: ReentrantMutex<()>,
}

fn abort_all(handles: Aborts) {
  if !handles.is_empty() {
    tracing::trace!(count = handles.len(), "aborting async projections");
  }
  for handle in handles {
    handle.abort();
  }
}

impl<T: Send + 'static, U: Send + 'static> AwaitCore<T, U> {
  fn on_next(self: &Arc<Self>, value: T) {
    let limit = self.options.limit();
    let mut aborts = Aborts::new();
    let start = {
      let mut state = self.state.lock();
      if state.terminated || state.source_done {
        return;
      }
      let seq = state.next_seq;
      state.next_seq += 1;
      match self.options.operation {
        AwaitOperation::Sequential => {
          if state.running.is_empty() && state.queue.is_empty() {
            Some(state.admit(seq, value))
          } else {
            state.queue.push_back((seq, value));
            None
          }
        }
        AwaitOperation::Drop => state.running.is_empty().then(|| state.admit(seq, value)),
        AwaitOperation::Switch => {
          aborts.extend(state.running.drain().map(|(_, handle)| handle));
          Some(state.admit(seq, value))
        }
        AwaitOperation::Parallel | AwaitOperation::SequentialParallel => {
          if state.running.len() < limit && state.queue.is_empty() {
            Some(state.admit(seq, value))
          } else {
            state.queue.push_back((seq, value));
            None
          }
        }
        AwaitOperation::ThrottleFirstLast => {
          if state.running.is_empty() {
            Some(state.admit(seq, value))
          } else {
            state.latest = Some((seq, value));
            None
          }
        }
      }
    };
    abort_all(aborts);
    if let Some(start) = start {
      self.start(start);
    }
  }

  fn start(self: &Arc<Self>, start: Start<T>) {
    let Start { seq, value, registration } = start;
    let selector = &self.selector;
    let projection = match panic::catch_unwind(AssertUnwindSafe(|| selector(value))) {
      Ok(projection) => projection,
      Err(payload) => {
        self.settle(seq, Err(RxError::from_panic(payload)));
        return;
      }
    };

    let core = Arc::downgrade(self);
    let task = Abortable::new(AssertUnwindSafe(projection).catch_unwind(), registration).map(
      move |finished| {
        // `Err(Aborted)`: the projection was cancelled and never settles.
        let Ok(caught) = finished else { return };
        let outcome = caught.unwrap_or_else(|payload| Err(RxError::from_panic(payload)));
        if let Some(core) = core.upgrade() {
          core.settle(seq, outcome);
        }
      },
    );
    if let Err(err) = self.options.executor.spawn(task) {
      tracing::error!(error = %err, "failed to spawn async projection");
      self.settle(seq, Err(RxError::custom(err)));
    }
  }

  fn settle(self: &Arc<Self>, seq: u64, outcome: Result<U, RxError>) {
    let _gate = self.emit_gate.lock();
    let limit = self.options.limit();
    let mut emits: SmallVec<[Result<U, RxError>; 2]> = SmallVec::new();
    let mut starts: SmallVec<[Start<T>; 2]> = SmallVec::new();
    let complete = {
      let mut state = self.state.lock();
      if state.terminated || state.running.remove(&seq).is_none() {
        return;
      }

      if self.options.operation == AwaitOperation::SequentialParallel {
        state.ready.insert(seq, outcome);
        loop {
          let next = state.next_emit;
          let Some(ready) = state.ready.remove(&next) else { break };
          emits.push(ready);
          state.next_emit += 1;
        }
      } else {
        emits.push(outcome);
      }

      match self.options.operation {
        AwaitOperation::Sequential
        | AwaitOperation::Parallel
        | AwaitOperation::SequentialParallel => {
          while state.running.len() < limit {
            let Some((next, value)) = state.queue.pop_front() else { break };
            starts.push(state.admit(next, value));
          }
        }
        AwaitOperation::ThrottleFirstLast => {
          if let Some((next, value)) = state.latest.take() {
            starts.push(state.admit(next, value));
          }
        }
        AwaitOperation::Drop | AwaitOperation::Switch => {}
      }

      let complete = state.source_done && state.is_idle();
      if complete {
        state.terminated = true;
      }
      complete
    };

    for emit in emits {
      match emit {
        Ok(value) => self.downstream.on_next(value),
        Err(err) => self.downstream.on_error_resume(err),
      }
    }
    if complete {
      self.downstream.on_completed(Completion::Success);
    }
    for start in starts {
      self.start(start);
    }
  }

  fn on_completed(&self, completion: Completion) {
    let (aborts, forward) = {
      let mut state = self.state.lock();
      if state.terminated {
        return;
      }
      state.source_done = true;
      match &completion {
        Completion::Failure(_) => (state.terminate(), true),
        Completion::Success if self.options.cancel_on_completed => (state.terminate(), true),
        Completion::Success if state.is_idle() => {
          state.terminated = true;
          (Aborts::new(), true)
        }
        Completion::Success => (Aborts::new(), false),
      }
    };
    abort_all(aborts);
    if forward {
      let _gate = self.emit_gate.lock();
      self.downstream.on_completed(completion);
    }
  }

  fn cancel(&self) {
    let aborts = self.state.lock().terminate();
    abort_all(aborts);
  }
}

struct AwaitObserver<T, U> {
  core: Arc<AwaitCore<T, U>>,
}

impl<T: Send + 'static, U: Send + 'static> Observer<T> for AwaitObserver<T, U> {
  fn on_next(&self, value: T) { self.core.on_next(value) }

  fn on_error_resume(&self, err: RxError) {
    let _gate = self.core.emit_gate.lock();
    self.core.downstream.on_error_resume(err);
  }

  fn on_completed(&self, completion: Completion) { self.core.on_completed(completion) }

  fn is_closed(&self) -> bool { self.core.downstream.is_closed() }
}

struct AwaitSubscription<T, U> {
  upstream: BoxDisposable,
  core: Arc<AwaitCore<T, U>>,
  disposed: AtomicBool,
}

impl<T: Send + 'static, U: Send + 'static> Disposable for AwaitSubscription<T, U> {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    self.upstream.dispose();
    self.core.cancel();
  }

  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use futures::{future::BoxFuture, FutureExt};
  use parking_lot::Mutex;

  use crate::prelude::*;

  fn ms(v: u64) -> Duration { Duration::from_millis(v) }

  /// Journal of projection lifecycles.
  #[derive(Clone, Default)]
  struct Journal(Arc<Mutex<Vec<String>>>);

  impl Journal {
    fn entries(&self) -> Vec<String> { self.0.lock().clone() }
  }

  /// Logs "cancel N" when dropped before being marked finished.
  struct Probe {
    id: u64,
    finished: bool,
    journal: Journal,
  }

  impl Drop for Probe {
    fn drop(&mut self) {
      if !self.finished {
        self.journal.0.lock().push(format!("cancel {}", self.id));
      }
    }
  }

  /// Selector sleeping `pause(v)` of `clock` time, then yielding `v`.
  fn sleepy(
    clock: &FakeTimeProvider,
    journal: &Journal,
    pause: fn(u64) -> u64,
  ) -> impl Fn(u64) -> BoxFuture<'static, Result<u64, RxError>> + Send + Sync + 'static {
    let clock = clock.clone();
    let journal = journal.clone();
    move |v| {
      let wait = sleep(&clock, ms(pause(v)));
      let mut probe = Probe { id: v, finished: false, journal: journal.clone() };
      async move {
        wait.await;
        probe.finished = true;
        probe.journal.0.lock().push(format!("done {}", probe.id));
        Ok(v)
      }
      .boxed()
    }
  }

  fn inline(operation: AwaitOperation) -> AwaitOptions {
    AwaitOptions::new(operation).executor(InlineExecutor)
  }

  #[rxpush_macro::test]
  fn switch_keeps_only_the_latest() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let subject = Subject::new();
    let recorder = Recorder::new();
    subject
      .clone()
      .select_await(inline(AwaitOperation::Switch), sleepy(&clock, &journal, |_| 5))
      .subscribe(recorder.clone())
      .unwrap();

    subject.on_next(0);
    clock.advance(ms(1));
    subject.on_next(1);
    clock.advance(ms(1));
    subject.on_next(2);
    clock.advance(ms(10));

    assert_eq!(recorder.values(), vec![2]);
    assert_eq!(journal.entries(), vec!["cancel 0", "cancel 1", "done 2"]);
  }

  #[rxpush_macro::test]
  fn sequential_runs_one_at_a_time_in_order() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let subject = Subject::new();
    let recorder = Recorder::new();
    subject
      .clone()
      .select_await(inline(AwaitOperation::Sequential), sleepy(&clock, &journal, |_| 5))
      .subscribe(recorder.clone())
      .unwrap();

    subject.on_next(0);
    clock.advance(ms(1));
    subject.on_next(1);
    clock.advance(ms(1));
    subject.on_next(2);
    subject.on_completed(Completion::Success);

    clock.advance(ms(3));
    assert_eq!(recorder.values(), vec![0]);
    clock.advance(ms(5));
    assert_eq!(recorder.values(), vec![0, 1]);
    assert!(!recorder.is_completed());
    clock.advance(ms(5));
    assert_eq!(recorder.values(), vec![0, 1, 2]);
    assert!(recorder.completion().unwrap().is_success());
    assert_eq!(journal.entries(), vec!["done 0", "done 1", "done 2"]);
  }

  fn uneven(v: u64) -> u64 {
    match v {
      0 => 30,
      1 => 10,
      _ => 20,
    }
  }

  #[rxpush_macro::test]
  fn parallel_emits_in_completion_order() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let recorder = Recorder::new();
    observable::from_iter(0..3u64)
      .select_await(inline(AwaitOperation::Parallel), sleepy(&clock, &journal, uneven))
      .subscribe(recorder.clone())
      .unwrap();

    clock.advance(ms(30));
    assert_eq!(recorder.values(), vec![1, 2, 0]);
    assert!(recorder.is_completed());
  }

  #[rxpush_macro::test]
  fn sequential_parallel_restores_arrival_order() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let recorder = Recorder::new();
    observable::from_iter(0..3u64)
      .select_await(inline(AwaitOperation::SequentialParallel), sleepy(&clock, &journal, uneven))
      .subscribe(recorder.clone())
      .unwrap();

    clock.advance(ms(20));
    assert!(recorder.values().is_empty());
    assert_eq!(journal.entries(), vec!["done 1", "done 2"]);
    clock.advance(ms(10));
    assert_eq!(recorder.values(), vec![0, 1, 2]);
    assert!(recorder.is_completed());
  }

  #[rxpush_macro::test]
  fn max_concurrent_bounds_parallel_work() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let recorder = Recorder::new();
    observable::from_iter(0..3u64)
      .select_await(
        inline(AwaitOperation::Parallel).max_concurrent(2),
        sleepy(&clock, &journal, uneven),
      )
      .subscribe(recorder.clone())
      .unwrap();

    // 0 and 1 start at once; 2 waits for 1 to settle at 10 and ends at 30.
    clock.advance(ms(29));
    assert_eq!(recorder.values(), vec![1]);
    clock.advance(ms(1));
    assert_eq!(recorder.values(), vec![1, 0, 2]);
  }

  #[rxpush_macro::test]
  fn drop_ignores_values_while_busy() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let subject = Subject::new();
    let recorder = Recorder::new();
    subject
      .clone()
      .select_await(inline(AwaitOperation::Drop), sleepy(&clock, &journal, |_| 5))
      .subscribe(recorder.clone())
      .unwrap();

    subject.on_next(0);
    clock.advance(ms(1));
    subject.on_next(1);
    clock.advance(ms(4));
    subject.on_next(2);
    clock.advance(ms(5));

    assert_eq!(recorder.values(), vec![0, 2]);
    assert_eq!(journal.entries(), vec!["done 0", "done 2"]);
  }

  #[rxpush_macro::test]
  fn throttle_first_last_runs_first_and_latest() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let recorder = Recorder::new();
    observable::from_iter(0..4u64)
      .select_await(inline(AwaitOperation::ThrottleFirstLast), sleepy(&clock, &journal, |_| 5))
      .subscribe(recorder.clone())
      .unwrap();

    clock.advance(ms(5));
    assert_eq!(recorder.values(), vec![0]);
    assert!(!recorder.is_completed());
    clock.advance(ms(5));
    assert_eq!(recorder.values(), vec![0, 3]);
    assert!(recorder.is_completed());
  }

  #[rxpush_macro::test]
  fn cancel_on_completed_aborts_outstanding_work() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let recorder = Recorder::new();
    observable::from_iter(0..2u64)
      .select_await(
        inline(AwaitOperation::Sequential).cancel_on_completed(true),
        sleepy(&clock, &journal, |_| 5),
      )
      .subscribe(recorder.clone())
      .unwrap();

    assert!(recorder.completion().unwrap().is_success());
    assert_eq!(journal.entries(), vec!["cancel 0"]);
    clock.advance(ms(20));
    assert!(recorder.values().is_empty());
    assert_eq!(clock.pending_count(), 0);
  }

  #[rxpush_macro::test]
  fn dispose_aborts_every_projection() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let subject = Subject::new();
    let recorder = Recorder::new();
    let subscription = subject
      .clone()
      .select_await(inline(AwaitOperation::Parallel), sleepy(&clock, &journal, |_| 5))
      .subscribe(recorder.clone())
      .unwrap();

    subject.on_next(0);
    subject.on_next(1);
    subscription.dispose();
    let mut entries = journal.entries();
    entries.sort();
    assert_eq!(entries, vec!["cancel 0", "cancel 1"]);
    assert_eq!(subject.observer_count(), 0);
    clock.advance(ms(10));
    assert!(recorder.notifications().is_empty());
  }

  #[rxpush_macro::test]
  fn failure_completion_is_forwarded_at_once() {
    let clock = FakeTimeProvider::new();
    let journal = Journal::default();
    let subject = Subject::new();
    let recorder = Recorder::new();
    subject
      .clone()
      .select_await(inline(AwaitOperation::Sequential), sleepy(&clock, &journal, |_| 5))
      .subscribe(recorder.clone())
      .unwrap();

    subject.on_next(0);
    subject.on_completed(Completion::failure(RxError::msg("gone")));
    assert!(recorder.completion().unwrap().is_failure());
    assert_eq!(journal.entries(), vec!["cancel 0"]);
  }

  #[rxpush_macro::test]
  fn selector_failures_are_resumable() {
    let recorder = Recorder::new();
    observable::from_iter(0..5)
      .select_await(inline(AwaitOperation::Parallel), |v: i32| {
        if v == 3 {
          panic!("refused three");
        }
        async move {
          match v {
            1 => Err(RxError::msg("odd one")),
            4 => panic!("lost four"),
            _ => Ok(v),
          }
        }
      })
      .subscribe(recorder.clone())
      .unwrap();

    assert_eq!(recorder.values(), vec![0, 2]);
    let errors: Vec<String> = recorder.errors().iter().map(ToString::to_string).collect();
    assert_eq!(
      errors,
      vec!["odd one", "callback panicked: refused three", "callback panicked: lost four"]
    );
    assert!(recorder.completion().unwrap().is_success());
  }

  #[rxpush_macro::test]
  fn where_await_keeps_accepted_values() {
    let recorder = Recorder::new();
    observable::from_iter(1..=6)
      .where_await(inline(AwaitOperation::Sequential), |v: i32| async move { Ok(v % 2 == 0) })
      .subscribe(recorder.clone())
      .unwrap();
    assert_eq!(recorder.values(), vec![2, 4, 6]);
    assert!(recorder.is_completed());
  }

  #[rxpush_macro::test(local)]
  async fn runs_on_a_thread_pool() {
    let (tx, rx) = futures::channel::oneshot::channel();
    let tx = Mutex::new(Some(tx));
    let collected = Arc::new(Mutex::new(Vec::new()));
    let c_collected = collected.clone();
    observable::from_iter(0..4)
      .select_await(AwaitOptions::new(AwaitOperation::SequentialParallel), |v: i32| async move {
        Ok(v * 2)
      })
      .subscribe_all(
        move |v| c_collected.lock().push(v),
        |_| {},
        move |_| {
          if let Some(tx) = tx.lock().take() {
            let _ = tx.send(());
          }
        },
      )
      .unwrap();
    rx.await.unwrap();
    assert_eq!(*collected.lock(), vec![0, 2, 4, 6]);
  }
}
