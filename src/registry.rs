//! Observer-registry collections backing every multicast hub.
//!
//! Both collections store `Arc<T>` items in a slot array. Mutation (`add`,
//! `remove`, `dispose`) is serialized by one lock per instance, while
//! [`snapshot`](FreeList::snapshot) is lock-free: each slot is an
//! [`ArcSwapOption`] and the array, together with its last occupied index,
//! is published through an [`ArcSwap`]. A reader racing with growth or
//! compaction sees either the old or the new array, never a torn one.
//!
//! - [`FreeList`]: removal by key in O(1), freed slots are reused.
//! - [`CompactList`]: first-null-slot insertion, identity removal, and
//!   shrinking compaction that may invalidate keys.
//!
//! Both start with four slots on the first `add` and grow by 1.5x.

use std::sync::{
  atomic::{AtomicIsize, Ordering},
  Arc,
};

use arc_swap::{ArcSwap, ArcSwapOption};

mod compact_list;
mod free_list;

pub use compact_list::CompactList;
pub use free_list::FreeList;

const INITIAL_CAPACITY: usize = 4;

fn grown_capacity(len: usize) -> usize {
  if len < INITIAL_CAPACITY {
    INITIAL_CAPACITY
  } else {
    len + len / 2
  }
}

/// One published generation of the slot array.
///
/// The last occupied index lives next to the values it describes, so a
/// reader loading one `Arc<Slots>` always gets a matching length and array.
pub(crate) struct Slots<T> {
  values: Box<[ArcSwapOption<T>]>,
  /// Index of the last occupied slot, `-1` when empty.
  last_index: AtomicIsize,
}

impl<T> Slots<T> {
  fn with_capacity(capacity: usize) -> Self {
    Slots {
      values: (0..capacity).map(|_| ArcSwapOption::empty()).collect(),
      last_index: AtomicIsize::new(-1),
    }
  }

  fn empty() -> Self { Slots::with_capacity(0) }

  #[inline]
  fn len(&self) -> usize { self.values.len() }

  fn last_index(&self) -> Option<usize> {
    let last = self.last_index.load(Ordering::Acquire);
    (last >= 0).then_some(last as usize)
  }

  fn set_last_index(&self, last: Option<usize>) {
    self.last_index.store(last.map_or(-1, |l| l as isize), Ordering::Release);
  }

  /// Number of slots a reader has to scan.
  fn live_len(&self) -> usize { self.last_index().map_or(0, |l| (l + 1).min(self.len())) }

  fn is_occupied(&self, index: usize) -> bool {
    self.values.get(index).is_some_and(|slot| slot.load().is_some())
  }

  fn holds(&self, index: usize, item: &Arc<T>) -> bool {
    self
      .values
      .get(index)
      .is_some_and(|slot| slot.load().as_ref().is_some_and(|v| Arc::ptr_eq(v, item)))
  }

  fn position_of(&self, item: &Arc<T>) -> Option<usize> {
    (0..self.live_len()).find(|&i| self.holds(i, item))
  }

  /// Copies every slot into a larger array.
  fn grow_to(&self, capacity: usize) -> Self {
    let grown = Slots::with_capacity(capacity);
    for (old, new) in self.values.iter().zip(grown.values.iter()) {
      new.store(old.load_full());
    }
    grown.set_last_index(self.last_index());
    grown
  }

  /// Copies the live items, in order, into the front of a new array.
  fn packed_to(&self, capacity: usize) -> Self {
    let packed = Slots::with_capacity(capacity);
    let live = self.values.iter().filter_map(|slot| slot.load_full());
    let mut stored: usize = 0;
    for (target, item) in packed.values.iter().zip(live) {
      target.store(Some(item));
      stored += 1;
    }
    packed.set_last_index(stored.checked_sub(1));
    packed
  }
}

/// Shared bookkeeping of both collections. Writers hold the owning
/// registry's lock; readers only ever `load` the published array.
struct SlotArray<T> {
  slots: ArcSwap<Slots<T>>,
}

impl<T> SlotArray<T> {
  fn new() -> Self { SlotArray { slots: ArcSwap::from_pointee(Slots::empty()) } }

  fn snapshot(&self) -> Snapshot<T> {
    let slots = self.slots.load_full();
    let len = slots.live_len();
    Snapshot { slots, len }
  }

  /// Writes `item` at `index`, which must be within the published array.
  fn store_at(&self, index: usize, item: Arc<T>) {
    let slots = self.slots.load();
    slots.values[index].store(Some(item));
    if slots.last_index().map_or(true, |last| index > last) {
      slots.set_last_index(Some(index));
    }
  }

  /// Clears `index` and walks back to the new last occupied slot.
  fn clear_at(&self, index: usize) {
    let slots = self.slots.load_full();
    slots.values[index].store(None);
    if slots.last_index() == Some(index) {
      let new_last = (0..index).rev().find(|&i| slots.is_occupied(i));
      slots.set_last_index(new_last);
    }
  }

  fn grow(&self) -> usize {
    let current = self.slots.load_full();
    let capacity = grown_capacity(current.len());
    tracing::trace!(from = current.len(), to = capacity, "registry grow");
    self.slots.store(Arc::new(current.grow_to(capacity)));
    capacity
  }

  /// Publishes a packed copy of the live items with room for `capacity`.
  fn pack(&self, capacity: usize) {
    let current = self.slots.load_full();
    let packed = current.packed_to(capacity);
    tracing::trace!(from = current.len(), to = capacity, "registry compact");
    self.slots.store(Arc::new(packed));
  }

  fn clear(&self) { self.slots.store(Arc::new(Slots::empty())); }
}

/// A consistent, possibly stale, view of the occupied prefix of a registry.
///
/// Slots removed after the snapshot was taken may already read as empty;
/// an item never appears twice.
pub struct Snapshot<T> {
  slots: Arc<Slots<T>>,
  len: usize,
}

impl<T> Snapshot<T> {
  /// Live items in slot order.
  pub fn iter(&self) -> impl Iterator<Item = Arc<T>> + '_ {
    self.slots.values[..self.len].iter().filter_map(|slot| slot.load_full())
  }

  /// Number of slots covered, including holes.
  pub fn span_len(&self) -> usize { self.len }

  pub fn is_empty(&self) -> bool { self.iter().next().is_none() }

  pub fn to_vec(&self) -> Vec<Arc<T>> { self.iter().collect() }
}
