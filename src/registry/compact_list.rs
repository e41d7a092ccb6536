use std::sync::Arc;

use parking_lot::Mutex;

use super::{SlotArray, Snapshot, INITIAL_CAPACITY};
use crate::error::RxError;

struct Gate {
  count: usize,
  disposed: bool,
}

/// Registry that keeps its occupied slots dense.
///
/// `add` fills the first empty slot. Removing items until no more than a
/// quarter of the capacity is occupied publishes a packed, smaller array;
/// keys handed out before that point are invalidated, which is why
/// [`remove_at`](Self::remove_at) validates its key by identity and falls
/// back to a scan.
pub struct CompactList<T> {
  array: SlotArray<T>,
  gate: Mutex<Gate>,
}

impl<T> Default for CompactList<T> {
  fn default() -> Self {
    CompactList { array: SlotArray::new(), gate: Mutex::new(Gate { count: 0, disposed: false }) }
  }
}

impl<T> CompactList<T> {
  pub fn new() -> Self { Self::default() }

  pub fn add(&self, item: Arc<T>) -> Result<usize, RxError> {
    let mut gate = self.gate.lock();
    if gate.disposed {
      return Err(RxError::AlreadyDisposed);
    }
    let slots = self.array.slots.load_full();
    let index = match (0..slots.len()).find(|&i| !slots.is_occupied(i)) {
      Some(index) => index,
      None => {
        self.array.grow();
        slots.len()
      }
    };
    self.array.store_at(index, item);
    gate.count += 1;
    Ok(index)
  }

  /// Removes `item` by identity.
  pub fn remove(&self, item: &Arc<T>) -> bool {
    let mut gate = self.gate.lock();
    if gate.disposed {
      return false;
    }
    match self.array.slots.load().position_of(item) {
      Some(index) => {
        self.remove_index(&mut gate, index);
        true
      }
      None => false,
    }
  }

  /// Removes `item` using `key` as a hint.
  pub fn remove_at(&self, key: usize, item: &Arc<T>) -> bool {
    let mut gate = self.gate.lock();
    if gate.disposed {
      return false;
    }
    let slots = self.array.slots.load_full();
    let index = if slots.holds(key, item) {
      Some(key)
    } else {
      slots.position_of(item)
    };
    match index {
      Some(index) => {
        self.remove_index(&mut gate, index);
        true
      }
      None => false,
    }
  }

  fn remove_index(&self, gate: &mut Gate, index: usize) {
    self.array.clear_at(index);
    gate.count -= 1;
    let capacity = self.array.slots.load().len();
    if capacity > INITIAL_CAPACITY && gate.count * 4 <= capacity {
      self.compact(gate.count);
    }
  }

  fn compact(&self, count: usize) { self.array.pack((count * 2).max(INITIAL_CAPACITY)) }

  pub fn snapshot(&self) -> Snapshot<T> { self.array.snapshot() }

  pub fn count(&self) -> usize { self.gate.lock().count }

  pub fn is_disposed(&self) -> bool { self.gate.lock().disposed }

  pub fn dispose(&self) {
    let mut gate = self.gate.lock();
    gate.disposed = true;
    gate.count = 0;
    self.array.clear();
  }
}
