use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Weak,
};

use super::subject_core::SubjectCore;
use crate::{disposable::Disposable, observer::Subscriber};

/// Detaches one subscriber from a subject.
///
/// Holds both the subject and the subscriber weakly: the subscriber owns
/// this handle as its upstream, and the subject's registry owns the
/// subscriber, so strong links would form a cycle. A subscriber that can no
/// longer be upgraded is no longer registered anywhere.
pub(crate) struct SubjectSubscription<T> {
  core: Weak<SubjectCore<T>>,
  key: usize,
  item: Weak<Subscriber<T>>,
  disposed: AtomicBool,
}

impl<T> SubjectSubscription<T> {
  pub(crate) fn new(core: Weak<SubjectCore<T>>, key: usize, item: &Arc<Subscriber<T>>) -> Self {
    SubjectSubscription { core, key, item: Arc::downgrade(item), disposed: AtomicBool::new(false) }
  }
}

impl<T> Disposable for SubjectSubscription<T> {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    if let (Some(core), Some(item)) = (self.core.upgrade(), self.item.upgrade()) {
      core.remove(self.key, &item);
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}
