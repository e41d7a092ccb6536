//! Integration tests for rxpush
//!
//! End-to-end scenarios across subjects, operators, providers and
//! threads.

use std::{
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread,
  time::Duration,
};

use parking_lot::Mutex;
use rxpush::prelude::*;

fn ms(v: u64) -> Duration { Duration::from_millis(v) }

#[rxpush_macro::test]
fn two_observers_then_a_late_one() {
  let subject = Subject::new();
  let first = Recorder::new();
  let second = Recorder::new();
  subject.subscribe(first.clone()).unwrap();
  subject.subscribe(second.clone()).unwrap();

  subject.on_next(1);
  subject.on_next(2);
  subject.on_next(3);
  subject.on_completed(Completion::Success);

  for recorder in [&first, &second] {
    assert_eq!(recorder.values(), vec![1, 2, 3]);
    assert!(recorder.completion().unwrap().is_success());
  }

  let late = Recorder::<i32>::new();
  subject.subscribe(late.clone()).unwrap();
  assert!(late.values().is_empty());
  assert_eq!(late.notifications().len(), 1);
  assert!(late.completion().unwrap().is_success());
}

#[rxpush_macro::test]
fn nothing_reaches_anyone_after_the_terminal_signal() {
  let subject = ReplaySubject::with_buffer_size(8);
  let early = Recorder::new();
  subject.subscribe(early.clone()).unwrap();
  subject.on_next("kept");
  subject.on_completed(Completion::failure(RxError::msg("stop")));
  subject.on_next("dropped");
  subject.on_error_resume(RxError::msg("dropped too"));

  let late = Recorder::new();
  subject.subscribe(late.clone()).unwrap();
  for recorder in [&early, &late] {
    assert_eq!(recorder.values(), vec!["kept"]);
    assert!(recorder.errors().is_empty());
    assert!(recorder.completion().unwrap().is_failure());
  }
}

#[rxpush_macro::test]
fn replay_keeps_the_last_k_of_n() {
  let subject = ReplaySubject::with_buffer_size(4);
  for v in 0..10 {
    subject.on_next(v);
  }
  let recorder = Recorder::new();
  subject.subscribe(recorder.clone()).unwrap();
  subject.on_next(10);
  assert_eq!(recorder.values(), vec![6, 7, 8, 9, 10]);
}

#[rxpush_macro::test]
fn behavior_subject_late_subscription() {
  let subject = BehaviorSubject::new(0);
  subject.on_next(7);
  subject.on_completed(Completion::Success);

  let late = Recorder::new();
  subject.subscribe(late.clone()).unwrap();
  assert_eq!(late.values(), vec![7]);
  assert!(late.is_completed());
}

#[rxpush_macro::test]
fn disposing_twice_is_harmless() {
  let released = Arc::new(AtomicUsize::new(0));
  let c_released = released.clone();
  let source = observable::create(move |_: Subscriber<i32>| {
    let released = c_released.clone();
    Ok(disposable::create(move || {
      released.fetch_add(1, Ordering::SeqCst);
    })
    .into_boxed())
  });

  let subscription = source.map(|v| v + 1).filter(|v| *v > 0).subscribe_next(|_| {}).unwrap();
  subscription.dispose();
  subscription.dispose();
  assert!(subscription.is_disposed());
  assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[rxpush_macro::test]
fn timer_rescheduled_from_its_own_callback() {
  let clock = FakeTimeProvider::new();
  let fired = Arc::new(Mutex::new(Vec::new()));
  let slot: Arc<Mutex<Option<Box<dyn Timer>>>> = Arc::new(Mutex::new(None));

  let c_clock = clock.clone();
  let c_fired = fired.clone();
  let c_slot = slot.clone();
  let timer = clock.create_timer(
    Arc::new(move || {
      c_fired.lock().push(c_clock.now());
      if c_fired.lock().len() == 1 {
        if let Some(timer) = c_slot.lock().as_ref() {
          // Overrides the one second period requested at creation.
          timer.change(Some(ms(250)), None);
        }
      }
    }),
    Some(ms(100)),
    Some(Duration::from_secs(1)),
  );
  *slot.lock() = Some(timer);

  clock.advance(Duration::from_secs(5));
  assert_eq!(*fired.lock(), vec![ms(100), ms(350)]);
}

#[rxpush_macro::test]
fn switch_and_sequential_on_the_same_emissions() {
  fn run(operation: AwaitOperation) -> (Vec<u64>, Vec<String>) {
    let clock = FakeTimeProvider::new();
    let journal = Arc::new(Mutex::new(Vec::new()));
    let subject = Subject::new();
    let recorder = Recorder::new();

    let c_clock = clock.clone();
    let c_journal = journal.clone();
    subject
      .clone()
      .select_await(AwaitOptions::new(operation).executor(InlineExecutor), move |v: u64| {
        let pause = sleep(&c_clock, ms(5));
        let journal = c_journal.clone();
        async move {
          pause.await;
          journal.lock().push(format!("done {v}"));
          Ok(v)
        }
      })
      .subscribe(recorder.clone())
      .unwrap();

    for v in 0..3 {
      subject.on_next(v);
      clock.advance(ms(1));
    }
    subject.on_completed(Completion::Success);
    clock.advance(ms(20));
    assert!(recorder.is_completed());
    let journal = journal.lock().clone();
    (recorder.values(), journal)
  }

  let (values, journal) = run(AwaitOperation::Switch);
  assert_eq!(values, vec![2]);
  assert_eq!(journal, vec!["done 2"]);

  let (values, journal) = run(AwaitOperation::Sequential);
  assert_eq!(values, vec![0, 1, 2]);
  assert_eq!(journal, vec!["done 0", "done 1", "done 2"]);
}

#[rxpush_macro::test]
fn concurrent_producers_and_subscribers() {
  let subject = Subject::new();
  let total = Arc::new(AtomicUsize::new(0));
  let c_total = total.clone();
  subject
    .subscribe_next(move |v: usize| {
      c_total.fetch_add(v, Ordering::SeqCst);
    })
    .unwrap();

  let producers: Vec<_> = (0..4)
    .map(|_| {
      let subject = subject.clone();
      thread::spawn(move || {
        for _ in 0..250 {
          subject.on_next(1);
          let churn = subject.subscribe_next(|_| {}).unwrap();
          churn.dispose();
        }
      })
    })
    .collect();
  for producer in producers {
    producer.join().unwrap();
  }

  assert_eq!(total.load(Ordering::SeqCst), 1000);
  assert_eq!(subject.observer_count(), 1);
}

#[rxpush_macro::test]
fn system_clock_drives_a_delayed_chain() {
  let (tx, rx) = std::sync::mpsc::channel();
  let tx = Mutex::new(tx);
  observable::from_iter(vec![1, 2, 3])
    .delay(ms(5), SystemTimeProvider)
    .subscribe_all(
      |_| {},
      |_| {},
      move |completion| {
        let _ = tx.lock().send(completion.is_success());
      },
    )
    .unwrap();
  assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
}

#[rxpush_macro::test]
fn frame_clock_drives_time_operators() {
  let frames = FakeFrameProvider::new();
  let clock = FrameTimeProvider::new(Arc::new(frames.clone()), ms(16));
  let recorder = Recorder::new();
  observable::timer(ms(40), clock).subscribe(recorder.clone()).unwrap();

  frames.advance_by(2);
  assert!(recorder.values().is_empty());
  frames.advance();
  assert_eq!(recorder.values(), vec![()]);
  assert!(recorder.is_completed());
}
