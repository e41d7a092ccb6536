//! Disposal handles.
//!
//! Every handle exposes [`Disposable::dispose`], which is idempotent and safe
//! to call from any thread, including from inside signal delivery. A second
//! call is a no-op and never runs a cleanup action twice.

use std::{
  fmt::{Debug, Formatter},
  sync::Arc,
};

mod anonymous;
mod builder;
mod combined;
mod composite;
mod serial;
mod single_assignment;

pub use anonymous::{create, empty, AnonymousDisposable, BooleanDisposable, EmptyDisposable};
pub use builder::DisposableBuilder;
pub use combined::{
  combine2, combine3, combine4, combine5, combine6, combine7, combine8, combine_all,
  CombinedDisposable, CombinedDisposables,
};
pub use composite::CompositeDisposable;
pub use serial::SerialDisposable;
pub use single_assignment::SingleAssignmentDisposable;

/// A resource that can be released exactly once.
pub trait Disposable: Send + Sync {
  /// Releases the resource. Calling it again has no effect.
  fn dispose(&self);

  fn is_disposed(&self) -> bool;
}

/// Type-erased disposal handle returned by `subscribe`.
pub type BoxDisposable = Box<dyn Disposable>;

impl<D: Disposable + ?Sized> Disposable for Box<D> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

impl<D: Disposable + ?Sized> Disposable for Arc<D> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

impl Debug for dyn Disposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("dyn Disposable").field("is_disposed", &self.is_disposed()).finish()
  }
}

/// Convenience methods available on every sized disposable.
pub trait DisposableExt: Disposable + Sized + 'static {
  /// Erases the concrete type.
  fn into_boxed(self) -> BoxDisposable { Box::new(self) }

  /// Activates "RAII" behavior: the returned guard disposes the handle when
  /// it goes out of scope.
  ///
  /// **Attention:** if the guard is not bound to a variable it is dropped,
  /// and the handle disposed, immediately.
  fn dispose_when_dropped(self) -> DisposeGuard<Self> { DisposeGuard(self) }
}

impl<D: Disposable + Sized + 'static> DisposableExt for D {}

/// Disposes the wrapped handle on drop.
#[derive(Debug)]
#[must_use]
pub struct DisposeGuard<D: Disposable>(D);

impl<D: Disposable> DisposeGuard<D> {
  pub fn new(inner: D) -> Self { DisposeGuard(inner) }

  pub fn get_ref(&self) -> &D { &self.0 }
}

impl<D: Disposable> Drop for DisposeGuard<D> {
  #[inline]
  fn drop(&mut self) { self.0.dispose() }
}
