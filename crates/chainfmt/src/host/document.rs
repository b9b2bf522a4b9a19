use std::cell::Cell;
use std::cell::RefCell;
use std::path::Path;
use std::path::PathBuf;

use super::HostDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
  /// Saving writes the text to the file.
  Disk,
  /// Saving only records the text as persisted (ex. text provided over stdin).
  Memory,
}

/// In-memory text of a file being edited.
pub struct Buffer {
  file_path: PathBuf,
  language_id: String,
  text: RefCell<String>,
  saved_text: RefCell<Option<String>>,
  save_target: SaveTarget,
  version: Cell<u32>,
}

impl Buffer {
  /// Opens a buffer whose text was never saved. It is always dirty.
  pub fn new_unsaved(file_path: PathBuf, language_id: String, text: String, save_target: SaveTarget) -> Self {
    Self::new(file_path, language_id, text, None, save_target)
  }

  /// Opens a buffer with pending text on top of the persisted text.
  pub fn new(file_path: PathBuf, language_id: String, text: String, saved_text: Option<String>, save_target: SaveTarget) -> Self {
    Self {
      file_path,
      language_id,
      text: RefCell::new(text),
      saved_text: RefCell::new(saved_text),
      save_target,
      version: Cell::new(1),
    }
  }

  pub fn save_target(&self) -> SaveTarget {
    self.save_target
  }

  pub fn version(&self) -> u32 {
    self.version.get()
  }

  pub fn set_text(&self, text: String) {
    if *self.text.borrow() == text {
      return;
    }
    *self.text.borrow_mut() = text;
    self.version.set(self.version.get() + 1);
  }

  pub fn mark_saved(&self) {
    *self.saved_text.borrow_mut() = Some(self.text.borrow().clone());
  }
}

impl HostDocument for Buffer {
  fn file_path(&self) -> &Path {
    &self.file_path
  }

  fn language_id(&self) -> &str {
    &self.language_id
  }

  fn text(&self) -> String {
    self.text.borrow().clone()
  }

  fn is_dirty(&self) -> bool {
    self.saved_text.borrow().as_deref() != Some(self.text.borrow().as_str())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn tracks_dirty_state() {
    let buffer = Buffer::new(PathBuf::from("/a.ts"), "typescript".to_string(), "a".to_string(), Some("a".to_string()), SaveTarget::Memory);
    assert!(!buffer.is_dirty());
    buffer.set_text("b".to_string());
    assert!(buffer.is_dirty());
    assert_eq!(buffer.version(), 2);
    buffer.mark_saved();
    assert!(!buffer.is_dirty());
    // same text doesn't bump the version
    buffer.set_text("b".to_string());
    assert_eq!(buffer.version(), 2);

    let buffer = Buffer::new_unsaved(PathBuf::from("/a.ts"), "typescript".to_string(), String::new(), SaveTarget::Disk);
    assert!(buffer.is_dirty());
  }
}
