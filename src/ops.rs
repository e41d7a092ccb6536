//! Operators. Each one attaches to exactly one source and forwards to one
//! downstream [`Subscriber`](crate::observer::Subscriber).

pub mod delay;
pub mod filter;
pub mod map;
pub mod on_error_resume_as_failure;
pub mod select_await;
pub mod take;

/// Implements the non-value half of [`Observer`](crate::observer::Observer)
/// by forwarding to the `$field` subscriber.
macro_rules! forward_error_and_completion {
  ($field:ident) => {
    #[inline]
    fn on_error_resume(&self, err: $crate::error::RxError) { self.$field.on_error_resume(err) }

    #[inline]
    fn on_completed(&self, completion: $crate::completion::Completion) {
      self.$field.on_completed(completion)
    }

    #[inline]
    fn is_closed(&self) -> bool { self.$field.is_closed() }
  };
}

pub(crate) use forward_error_and_completion;
