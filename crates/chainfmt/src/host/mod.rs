mod document;
mod formatters;
mod local_host;
mod process_formatter;

pub use document::*;
pub use formatters::*;
pub use local_host::*;
pub use process_formatter::*;

use std::path::Path;

use anyhow::Result;

use crate::configuration::Settings;

/// A live document owned by the host.
pub trait HostDocument {
  fn file_path(&self) -> &Path;
  fn language_id(&self) -> &str;
  fn text(&self) -> String;
  /// Whether the text differs from what was last persisted.
  fn is_dirty(&self) -> bool;
}

/// What the pipeline needs from the editing host.
pub trait EditorHost {
  type Document: HostDocument;

  fn settings(&self) -> &Settings;

  /// The host's generic "format now" action. It formats the document with
  /// whichever formatter is currently active for the document's language.
  async fn format_document(&self, document: &Self::Document) -> Result<()>;

  async fn save_document(&self, document: &Self::Document) -> Result<()>;
}
