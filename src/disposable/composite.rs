use parking_lot::Mutex;
use smallvec::SmallVec;

use super::{BoxDisposable, Disposable};

struct CompositeState {
  next_id: usize,
  items: SmallVec<[(usize, BoxDisposable); 2]>,
  disposed: bool,
}

/// A growable group of handles with ID-based removal.
///
/// Adding to a disposed composite disposes the added handle immediately.
/// Closed members are pruned on every add.
pub struct CompositeDisposable {
  state: Mutex<CompositeState>,
}

impl Default for CompositeDisposable {
  fn default() -> Self {
    CompositeDisposable {
      state: Mutex::new(CompositeState { next_id: 0, items: SmallVec::new(), disposed: false }),
    }
  }
}

impl CompositeDisposable {
  pub fn new() -> Self { Self::default() }

  /// Adds a handle and returns its ID, or `None` if the composite was
  /// already disposed (the handle has then been disposed).
  pub fn add(&self, disposable: BoxDisposable) -> Option<usize> {
    let mut state = self.state.lock();
    if state.disposed {
      drop(state);
      disposable.dispose();
      return None;
    }
    state.items.retain(|(_, d)| !d.is_disposed());
    let id = state.next_id;
    state.next_id += 1;
    state.items.push((id, disposable));
    Some(id)
  }

  /// Removes the handle with `id` and disposes it. Returns `false` when no
  /// such member exists.
  pub fn remove(&self, id: usize) -> bool {
    let removed = {
      let mut state = self.state.lock();
      state.items.iter().position(|(i, _)| *i == id).map(|pos| state.items.remove(pos).1)
    };
    match removed {
      Some(d) => {
        d.dispose();
        true
      }
      None => false,
    }
  }

  pub fn len(&self) -> usize { self.state.lock().items.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Disposable for CompositeDisposable {
  fn dispose(&self) {
    let items = {
      let mut state = self.state.lock();
      if state.disposed {
        return;
      }
      state.disposed = true;
      std::mem::take(&mut state.items)
    };
    for (_, item) in items {
      item.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.state.lock().disposed }
}
