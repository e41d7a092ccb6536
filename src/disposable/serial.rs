use parking_lot::Mutex;

use super::{BoxDisposable, Disposable};

struct SerialState {
  current: Option<BoxDisposable>,
  disposed: bool,
}

/// Holds one replaceable inner resource.
///
/// Setting a new resource disposes the previous one. After disposal, any
/// resource handed to [`set`](Self::set) is disposed immediately.
pub struct SerialDisposable {
  state: Mutex<SerialState>,
}

impl Default for SerialDisposable {
  fn default() -> Self {
    SerialDisposable { state: Mutex::new(SerialState { current: None, disposed: false }) }
  }
}

impl SerialDisposable {
  pub fn new() -> Self { Self::default() }

  pub fn set(&self, disposable: BoxDisposable) {
    let previous = {
      let mut state = self.state.lock();
      if state.disposed {
        Some(disposable)
      } else {
        state.current.replace(disposable)
      }
    };
    if let Some(previous) = previous {
      previous.dispose();
    }
  }

  /// Disposes and forgets the current resource without disposing `self`.
  pub fn clear(&self) {
    let previous = self.state.lock().current.take();
    if let Some(previous) = previous {
      previous.dispose();
    }
  }
}

impl Disposable for SerialDisposable {
  fn dispose(&self) {
    let current = {
      let mut state = self.state.lock();
      if state.disposed {
        return;
      }
      state.disposed = true;
      state.current.take()
    };
    if let Some(current) = current {
      current.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.state.lock().disposed }
}
