use smallvec::SmallVec;

use super::{
  BoxDisposable, CombinedDisposable, CombinedDisposables, Disposable, EmptyDisposable,
};

/// Accumulates handles and folds them into the cheapest single handle.
///
/// | accumulated | built as                          |
/// |-------------|-----------------------------------|
/// | 0           | [`EmptyDisposable`]               |
/// | 1           | the handle itself                 |
/// | 2..=8       | [`CombinedDisposable<N>`]         |
/// | more        | [`CombinedDisposables`]           |
#[derive(Default)]
pub struct DisposableBuilder {
  items: SmallVec<[BoxDisposable; 4]>,
}

impl DisposableBuilder {
  pub fn new() -> Self { Self::default() }

  pub fn add(&mut self, disposable: impl Disposable + 'static) {
    self.items.push(Box::new(disposable));
  }

  pub fn add_boxed(&mut self, disposable: BoxDisposable) { self.items.push(disposable); }

  pub fn count(&self) -> usize { self.items.len() }

  pub fn build(self) -> BoxDisposable {
    let mut items = self.items;
    match items.len() {
      0 => Box::new(EmptyDisposable),
      1 => match items.pop() {
        Some(single) => single,
        None => Box::new(EmptyDisposable),
      },
      2 => fixed::<2>(items.into_vec()),
      3 => fixed::<3>(items.into_vec()),
      4 => fixed::<4>(items.into_vec()),
      5 => fixed::<5>(items.into_vec()),
      6 => fixed::<6>(items.into_vec()),
      7 => fixed::<7>(items.into_vec()),
      8 => fixed::<8>(items.into_vec()),
      _ => Box::new(CombinedDisposables::new(items.into_vec())),
    }
  }

  /// Disposes everything accumulated so far without building.
  pub fn dispose(self) {
    for item in self.items {
      item.dispose();
    }
  }
}

fn fixed<const N: usize>(items: Vec<BoxDisposable>) -> BoxDisposable {
  match <[BoxDisposable; N]>::try_from(items) {
    Ok(array) => Box::new(CombinedDisposable::new(array)),
    Err(items) => Box::new(CombinedDisposables::new(items)),
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;
  use crate::disposable::create;

  fn build_with(n: usize, hits: &Arc<AtomicUsize>) -> BoxDisposable {
    let mut builder = DisposableBuilder::new();
    for _ in 0..n {
      let hits = hits.clone();
      builder.add(create(move || {
        hits.fetch_add(1, Ordering::SeqCst);
      }));
    }
    assert_eq!(builder.count(), n);
    builder.build()
  }

  #[rxpush_macro::test]
  fn every_size_disposes_all_members_once() {
    for n in [0, 1, 2, 5, 8, 9, 20] {
      let hits = Arc::new(AtomicUsize::new(0));
      let built = build_with(n, &hits);
      built.dispose();
      built.dispose();
      assert_eq!(hits.load(Ordering::SeqCst), n, "size {n}");
      assert!(built.is_disposed());
    }
  }

  #[rxpush_macro::test]
  fn dispose_without_build() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut builder = DisposableBuilder::new();
    let c_hits = hits.clone();
    builder.add(create(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    }));
    builder.dispose();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }
}
