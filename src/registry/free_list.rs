use std::sync::Arc;

use parking_lot::Mutex;

use super::{SlotArray, Snapshot};
use crate::error::RxError;

struct Gate {
  free: Vec<usize>,
  count: usize,
  disposed: bool,
}

/// Registry with O(1) keyed removal and slot reuse.
///
/// `add` hands out the slot index as key. `remove` trusts the key only
/// when the slot still holds the very same `Arc`; otherwise it falls back
/// to an identity scan so a stale key can never evict another item.
pub struct FreeList<T> {
  array: SlotArray<T>,
  gate: Mutex<Gate>,
}

impl<T> Default for FreeList<T> {
  fn default() -> Self {
    FreeList {
      array: SlotArray::new(),
      gate: Mutex::new(Gate { free: Vec::new(), count: 0, disposed: false }),
    }
  }
}

impl<T> FreeList<T> {
  pub fn new() -> Self { Self::default() }

  /// Registers `item` and returns its key.
  pub fn add(&self, item: Arc<T>) -> Result<usize, RxError> {
    let mut gate = self.gate.lock();
    if gate.disposed {
      return Err(RxError::AlreadyDisposed);
    }
    let index = match gate.free.pop() {
      Some(index) => index,
      None => {
        let old_len = self.array.slots.load().len();
        let new_len = self.array.grow();
        // Lowest index pops first.
        gate.free.extend((old_len + 1..new_len).rev());
        old_len
      }
    };
    self.array.store_at(index, item);
    gate.count += 1;
    Ok(index)
  }

  /// Removes `item`, registered under `key`. Returns `false` if the item is
  /// not registered (already removed, or the list was disposed).
  pub fn remove(&self, key: usize, item: &Arc<T>) -> bool {
    let mut gate = self.gate.lock();
    if gate.disposed {
      return false;
    }
    let slots = self.array.slots.load_full();
    let index = if slots.holds(key, item) {
      key
    } else {
      match slots.position_of(item) {
        Some(index) => index,
        None => return false,
      }
    };
    self.array.clear_at(index);
    gate.free.push(index);
    gate.count -= 1;
    true
  }

  pub fn snapshot(&self) -> Snapshot<T> { self.array.snapshot() }

  pub fn count(&self) -> usize { self.gate.lock().count }

  pub fn is_disposed(&self) -> bool { self.gate.lock().disposed }

  /// Clears every slot and rejects further `add` calls.
  pub fn dispose(&self) {
    let mut gate = self.gate.lock();
    gate.disposed = true;
    gate.free.clear();
    gate.count = 0;
    self.array.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxpush_macro::test]
  fn keys_are_reused_lowest_first() {
    let list = FreeList::new();
    let items: Vec<_> = (0..5).map(Arc::new).collect();
    let keys: Vec<_> = items.iter().map(|i| list.add(i.clone()).unwrap()).collect();
    assert_eq!(keys, vec![0, 1, 2, 3, 4]);

    assert!(list.remove(1, &items[1]));
    let again = Arc::new(99);
    assert_eq!(list.add(again.clone()).unwrap(), 1);
    let values: Vec<i32> = list.snapshot().iter().map(|v| *v).collect();
    assert_eq!(values, vec![0, 99, 2, 3, 4]);
  }

  #[rxpush_macro::test]
  fn stale_key_never_removes_another_item() {
    let list = FreeList::new();
    let a = Arc::new("a");
    let b = Arc::new("b");
    let key_a = list.add(a.clone()).unwrap();
    list.add(b.clone()).unwrap();

    assert!(list.remove(key_a, &a));
    let c = Arc::new("c");
    assert_eq!(list.add(c.clone()).unwrap(), key_a);

    // `a` is gone; its old key now belongs to `c`.
    assert!(!list.remove(key_a, &a));
    assert_eq!(list.count(), 2);

    // A wrong key still finds `b` by identity.
    assert!(list.remove(key_a, &b));
    assert_eq!(list.snapshot().to_vec().len(), 1);
  }

  #[rxpush_macro::test]
  fn snapshot_survives_later_mutation() {
    let list = FreeList::new();
    let a = Arc::new(1);
    let key = list.add(a.clone()).unwrap();
    let snapshot = list.snapshot();
    list.add(Arc::new(2)).unwrap();
    assert_eq!(snapshot.span_len(), 1);
    assert_eq!(snapshot.to_vec().len(), 1);

    // Same array: removal is visible through the older snapshot.
    list.remove(key, &a);
    assert!(snapshot.is_empty());

    // The older snapshot keeps its span: slot 0 is refilled in place, slots
    // past its last index stay invisible to it.
    let before_grow = list.snapshot();
    for i in 0..10 {
      list.add(Arc::new(i)).unwrap();
    }
    assert_eq!(before_grow.span_len(), 2);
    assert_eq!(before_grow.to_vec().len(), 2);
    assert_eq!(list.snapshot().to_vec().len(), 11);
  }

  #[rxpush_macro::test]
  fn add_after_dispose_fails() {
    let list = FreeList::new();
    list.add(Arc::new(1)).unwrap();
    list.dispose();
    assert!(list.snapshot().is_empty());
    assert!(list.is_disposed());
    assert!(matches!(list.add(Arc::new(2)), Err(RxError::AlreadyDisposed)));
  }
}
