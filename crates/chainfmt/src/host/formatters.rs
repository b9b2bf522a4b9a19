use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;

pub struct FormatRequest {
  pub file_path: PathBuf,
  pub language_id: String,
  pub file_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutput {
  /// The formatter made no changes.
  Unchanged,
  Text(String),
  /// The formatter rewrote the file on disk and the document should be reloaded.
  FileUpdated,
}

/// An opaque formatting capability identified by a string id.
#[async_trait(?Send)]
pub trait Formatter {
  fn id(&self) -> &str;
  /// Whether this formatter reads the file from disk instead of taking the text.
  fn operates_on_disk(&self) -> bool {
    false
  }
  async fn format_text(&self, request: FormatRequest) -> Result<FormatOutput>;
}

/// Looks up formatters by id.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
  formatters: IndexMap<String, Rc<dyn Formatter>>,
}

impl FormatterRegistry {
  pub fn register(&mut self, formatter: Rc<dyn Formatter>) {
    self.formatters.insert(formatter.id().to_string(), formatter);
  }

  pub fn get(&self, id: &str) -> Option<Rc<dyn Formatter>> {
    self.formatters.get(id).cloned()
  }

  pub fn ids(&self) -> impl Iterator<Item = &str> {
    self.formatters.keys().map(|id| id.as_str())
  }

  /// Removes the formatters not matching the predicate and returns their ids.
  pub fn retain(&mut self, mut keep: impl FnMut(&dyn Formatter) -> bool) -> Vec<String> {
    let mut removed = Vec::new();
    self.formatters.retain(|id, formatter| {
      let keep = keep(formatter.as_ref());
      if !keep {
        removed.push(id.clone());
      }
      keep
    });
    removed
  }
}

/// Formatter backed by a closure.
#[cfg(test)]
pub struct TestFormatter {
  id: String,
  format: Box<dyn Fn(&FormatRequest) -> Result<FormatOutput>>,
}

#[cfg(test)]
impl TestFormatter {
  pub fn new(id: &str, format: impl Fn(&FormatRequest) -> Result<FormatOutput> + 'static) -> Rc<dyn Formatter> {
    Rc::new(Self {
      id: id.to_string(),
      format: Box::new(format),
    })
  }

  /// Maps one exact input text to an output text and leaves anything else alone.
  pub fn replacing(id: &str, from: &str, to: &str) -> Rc<dyn Formatter> {
    let from = from.to_string();
    let to = to.to_string();
    Self::new(id, move |request| {
      Ok(if request.file_text == from {
        FormatOutput::Text(to.clone())
      } else {
        FormatOutput::Unchanged
      })
    })
  }

  pub fn failing(id: &str, message: &str) -> Rc<dyn Formatter> {
    let message = message.to_string();
    Self::new(id, move |_| anyhow::bail!("{}", message))
  }
}

#[cfg(test)]
#[async_trait(?Send)]
impl Formatter for TestFormatter {
  fn id(&self) -> &str {
    &self.id
  }

  async fn format_text(&self, request: FormatRequest) -> Result<FormatOutput> {
    tokio::task::yield_now().await;
    (self.format)(&request)
  }
}
