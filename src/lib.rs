//! # rxpush: a push-based reactive runtime
//!
//! Observables push values, resumable errors and one terminal
//! [`Completion`] into observers. Every subscription hands back a
//! [`Disposable`]; disposing it, or the stream completing, releases the
//! whole chain of producer-side resources.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxpush::prelude::*;
//!
//! let subject = Subject::<i32>::new();
//! let recorder = Recorder::new();
//! subject.clone().filter(|v| v % 2 == 0).map(|v| v * 10).subscribe(recorder.clone()).unwrap();
//!
//! for v in 1..=4 {
//!   subject.on_next(v);
//! }
//! subject.on_completed(Completion::Success);
//! assert_eq!(recorder.values(), vec![20, 40]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Something a subscriber attaches to |
//! | [`Observer`] | Receives `on_next`, `on_error_resume` and `on_completed` |
//! | [`Subscriber`] | Guarded observer; also the subscription handle |
//! | [`Subject`] | Observer and observable at once |
//! | [`TimeProvider`] / [`FrameProvider`] | Pluggable clocks for time-based operators |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `futures` thread pool as the default
//!   executor of async projections
//! - **`tokio-scheduler`**: [`TokioExecutor`](scheduler::TokioExecutor)
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscriber`]: observer::Subscriber
//! [`Subject`]: subject::Subject
//! [`Completion`]: completion::Completion
//! [`Disposable`]: disposable::Disposable
//! [`TimeProvider`]: scheduler::TimeProvider
//! [`FrameProvider`]: scheduler::FrameProvider

pub mod completion;
pub mod disposable;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod registry;
pub mod scheduler;
pub mod subject;
pub mod system;

pub use prelude::*;

#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
