use parking_lot::Mutex;

use super::{BoxDisposable, Disposable};
use crate::error::RxError;

enum Slot {
  Empty,
  Assigned(BoxDisposable),
  Disposed,
}

/// Accepts its inner resource at most once.
///
/// If `dispose` wins the race against [`set`](Self::set), the late resource
/// is disposed immediately instead of being stored.
pub struct SingleAssignmentDisposable {
  slot: Mutex<Slot>,
}

impl Default for SingleAssignmentDisposable {
  fn default() -> Self { SingleAssignmentDisposable { slot: Mutex::new(Slot::Empty) } }
}

impl SingleAssignmentDisposable {
  pub fn new() -> Self { Self::default() }

  /// Assigns the inner resource.
  ///
  /// Returns [`RxError::AlreadyAssigned`] on a second assignment; the
  /// rejected resource is disposed before returning.
  pub fn set(&self, disposable: BoxDisposable) -> Result<(), RxError> {
    let mut slot = self.slot.lock();
    if matches!(*slot, Slot::Empty) {
      *slot = Slot::Assigned(disposable);
      return Ok(());
    }
    let already_assigned = matches!(*slot, Slot::Assigned(_));
    drop(slot);

    disposable.dispose();
    if already_assigned {
      Err(RxError::AlreadyAssigned)
    } else {
      Ok(())
    }
  }

  /// `true` once a resource was assigned or the handle was disposed.
  pub fn is_assigned(&self) -> bool { !matches!(&*self.slot.lock(), Slot::Empty) }
}

impl Disposable for SingleAssignmentDisposable {
  fn dispose(&self) {
    let previous = std::mem::replace(&mut *self.slot.lock(), Slot::Disposed);
    if let Slot::Assigned(inner) = previous {
      inner.dispose();
    }
  }

  fn is_disposed(&self) -> bool { matches!(&*self.slot.lock(), Slot::Disposed) }
}
