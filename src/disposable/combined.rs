use std::sync::atomic::{AtomicBool, Ordering};

use super::{BoxDisposable, Disposable};

/// Fixed-size group of handles disposed together.
///
/// The array length is part of the type, so groups of two to eight handles
/// need no extra heap allocation for the group itself.
pub struct CombinedDisposable<const N: usize> {
  items: [BoxDisposable; N],
  disposed: AtomicBool,
}

impl<const N: usize> CombinedDisposable<N> {
  pub fn new(items: [BoxDisposable; N]) -> Self {
    CombinedDisposable { items, disposed: AtomicBool::new(false) }
  }
}

impl<const N: usize> Disposable for CombinedDisposable<N> {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    for item in &self.items {
      item.dispose();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

/// Vector-backed group for any number of handles.
pub struct CombinedDisposables {
  items: Vec<BoxDisposable>,
  disposed: AtomicBool,
}

impl CombinedDisposables {
  pub fn new(items: Vec<BoxDisposable>) -> Self {
    CombinedDisposables { items, disposed: AtomicBool::new(false) }
  }

  pub fn len(&self) -> usize { self.items.len() }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

impl Disposable for CombinedDisposables {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    for item in &self.items {
      item.dispose();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

macro_rules! impl_combine {
  ($($name:ident => $n:literal ($($arg:ident),+);)+) => {
    $(
      #[doc = concat!("Combines ", stringify!($n), " handles into one.")]
      pub fn $name($($arg: impl Disposable + 'static),+) -> CombinedDisposable<$n> {
        CombinedDisposable::new([$(Box::new($arg) as BoxDisposable),+])
      }
    )+
  };
}

impl_combine! {
  combine2 => 2 (d1, d2);
  combine3 => 3 (d1, d2, d3);
  combine4 => 4 (d1, d2, d3, d4);
  combine5 => 5 (d1, d2, d3, d4, d5);
  combine6 => 6 (d1, d2, d3, d4, d5, d6);
  combine7 => 7 (d1, d2, d3, d4, d5, d6, d7);
  combine8 => 8 (d1, d2, d3, d4, d5, d6, d7, d8);
}

/// Combines any number of handles.
pub fn combine_all(items: impl IntoIterator<Item = BoxDisposable>) -> CombinedDisposables {
  CombinedDisposables::new(items.into_iter().collect())
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::disposable::create;

  fn counter(hits: &Arc<AtomicUsize>) -> impl Disposable + 'static {
    let hits = hits.clone();
    create(move || {
      hits.fetch_add(1, Ordering::SeqCst);
    })
  }

  #[rxpush_macro::test]
  fn fixed_group_disposes_every_member_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let group = combine5(
      counter(&hits),
      counter(&hits),
      counter(&hits),
      counter(&hits),
      counter(&hits),
    );
    group.dispose();
    group.dispose();
    assert_eq!(hits.load(Ordering::SeqCst), 5);
    assert!(group.is_disposed());
  }

  #[rxpush_macro::test]
  fn vector_group_disposes_every_member_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let group = combine_all((0..12).map(|_| Box::new(counter(&hits)) as BoxDisposable));
    assert_eq!(group.len(), 12);
    group.dispose();
    group.dispose();
    assert_eq!(hits.load(Ordering::SeqCst), 12);
  }
}
