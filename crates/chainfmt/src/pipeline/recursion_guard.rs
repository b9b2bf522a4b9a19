use std::cell::Cell;
use std::rc::Rc;

/// Process-wide flag that is set exactly while a pipeline run is in progress.
///
/// A formatter's side effects (ex. a save that triggers format-on-save) must
/// never start a nested run, so acquiring while held fails instead of waiting.
#[derive(Clone, Default)]
pub struct RecursionGuard(Rc<Cell<bool>>);

impl RecursionGuard {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn try_acquire(&self) -> Option<RecursionPermit> {
    if self.0.replace(true) {
      None
    } else {
      Some(RecursionPermit(self.0.clone()))
    }
  }

  pub fn is_held(&self) -> bool {
    self.0.get()
  }
}

/// Releases the flag when dropped, including on early returns and when the
/// owning future is dropped mid-run.
pub struct RecursionPermit(Rc<Cell<bool>>);

impl Drop for RecursionPermit {
  fn drop(&mut self) {
    self.0.set(false);
  }
}
