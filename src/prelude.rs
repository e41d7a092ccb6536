//! Prelude module for convenient imports.

// Modules used by path, e.g. `observable::from_iter`, `disposable::create`
pub use crate::{disposable, observable};
// Core traits and signal types
pub use crate::{
  completion::{Completion, Notification},
  disposable::{BoxDisposable, Disposable, DisposableExt},
  error::RxError,
  observable::{BoxObservable, Observable, ObservableExt},
  observer::{from_fn, from_fns, Observer, Recorder, Subscriber},
};
// Operators configuration
pub use crate::ops::select_await::{AwaitOperation, AwaitOptions};
// Scheduling
pub use crate::scheduler::{
  sleep, timeout, FakeFrameProvider, FakeTimeProvider, FrameProvider, FrameRunner,
  FrameTimeProvider, InlineExecutor, SystemTimeProvider, TimeProvider, Timer, TimerFrameProvider,
};
// Subjects
pub use crate::subject::{BehaviorSubject, ReplaySubject, Subject, Window};
// Unhandled errors
pub use crate::system::{reset_unhandled_exception_handler, set_unhandled_exception_handler};
