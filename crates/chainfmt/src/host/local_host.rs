use anyhow::Result;
use anyhow::anyhow;
use anyhow::bail;

use super::Buffer;
use super::EditorHost;
use super::FormatOutput;
use super::FormatRequest;
use super::FormatterRegistry;
use super::HostDocument;
use super::SaveTarget;
use crate::configuration::DEFAULT_FORMATTER_KEY;
use crate::configuration::Settings;
use crate::environment::Environment;
use crate::pipeline::is_reserved_id;

/// Host backed by the local file system and a registry of formatters.
pub struct LocalHost<TEnvironment: Environment> {
  environment: TEnvironment,
  settings: Settings,
  registry: FormatterRegistry,
}

impl<TEnvironment: Environment> LocalHost<TEnvironment> {
  pub fn new(environment: TEnvironment, settings: Settings, registry: FormatterRegistry) -> Self {
    Self {
      environment,
      settings,
      registry,
    }
  }

  fn active_formatter_id(&self, language_id: &str) -> Result<String> {
    let id = self
      .settings
      .get::<String>(DEFAULT_FORMATTER_KEY, Some(language_id))?
      .ok_or_else(|| anyhow!("No formatter is active for '{}'.", language_id))?;
    if is_reserved_id(&id) {
      bail!("The active formatter for '{}' is this orchestrator.", language_id);
    }
    Ok(id)
  }
}

impl<TEnvironment: Environment> EditorHost for LocalHost<TEnvironment> {
  type Document = Buffer;

  fn settings(&self) -> &Settings {
    &self.settings
  }

  async fn format_document(&self, document: &Buffer) -> Result<()> {
    let id = self.active_formatter_id(document.language_id())?;
    let formatter = self
      .registry
      .get(&id)
      .ok_or_else(|| anyhow!("Formatter '{}' is not available.", id))?;
    if formatter.operates_on_disk() && self.environment.read_file(document.file_path()).ok().as_deref() != Some(document.text().as_str()) {
      log_warn!(
        self.environment,
        "Formatter '{}' reads {} from disk, but it has unsaved changes. Enable chainfmt.saveAfterEachFormatter for it to see them.",
        id,
        document.file_path().display()
      );
    }
    let output = formatter
      .format_text(FormatRequest {
        file_path: document.file_path().to_path_buf(),
        language_id: document.language_id().to_string(),
        file_text: document.text(),
      })
      .await?;
    match output {
      FormatOutput::Unchanged => {
        log_debug!(self.environment, "Formatter '{}' made no changes.", id);
        return Ok(());
      }
      FormatOutput::Text(text) => document.set_text(text),
      FormatOutput::FileUpdated => {
        let text = self.environment.read_file(document.file_path())?;
        document.set_text(text);
        document.mark_saved();
      }
    }
    log_debug!(self.environment, "{} is at version {}.", document.file_path().display(), document.version());
    Ok(())
  }

  async fn save_document(&self, document: &Buffer) -> Result<()> {
    if document.save_target() == SaveTarget::Disk {
      self.environment.write_file(document.file_path(), &document.text())?;
    }
    document.mark_saved();
    log_debug!(self.environment, "Saved {}", document.file_path().display());
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use std::path::PathBuf;

  use pretty_assertions::assert_eq;

  use super::*;
  use crate::configuration::SettingsLayer;
  use crate::configuration::SettingsScope;
  use crate::environment::TestEnvironment;
  use crate::host::TestFormatter;

  fn create_host(environment: &TestEnvironment, settings_text: &str) -> LocalHost<TestEnvironment> {
    let settings = Settings::new().with_layer(SettingsScope::Workspace, SettingsLayer::parse(settings_text).unwrap());
    let mut registry = FormatterRegistry::default();
    registry.register(TestFormatter::replacing("upper", "a", "A"));
    LocalHost::new(environment.clone(), settings, registry)
  }

  #[tokio::test]
  async fn formats_with_active_formatter() {
    let environment = TestEnvironment::new();
    let host = create_host(&environment, r#"{ "[rust]": { "editor.defaultFormatter": "upper" } }"#);
    let buffer = Buffer::new_unsaved(PathBuf::from("/a.rs"), "rust".to_string(), "a".to_string(), SaveTarget::Disk);
    host.format_document(&buffer).await.unwrap();
    assert_eq!(buffer.text(), "A");
    host.save_document(&buffer).await.unwrap();
    assert_eq!(environment.get_file_text("/a.rs"), Some("A".to_string()));
    assert!(!buffer.is_dirty());
  }

  #[tokio::test]
  async fn errors_without_active_or_known_formatter() {
    let environment = TestEnvironment::new();
    let buffer = Buffer::new_unsaved(PathBuf::from("/a.rs"), "rust".to_string(), "a".to_string(), SaveTarget::Memory);
    let host = create_host(&environment, "{}");
    assert_eq!(host.format_document(&buffer).await.err().unwrap().to_string(), "No formatter is active for 'rust'.");
    let host = create_host(&environment, r#"{ "editor.defaultFormatter": "missing" }"#);
    assert_eq!(host.format_document(&buffer).await.err().unwrap().to_string(), "Formatter 'missing' is not available.");
    let host = create_host(&environment, r#"{ "editor.defaultFormatter": "chainfmt" }"#);
    assert_eq!(
      host.format_document(&buffer).await.err().unwrap().to_string(),
      "The active formatter for 'rust' is this orchestrator."
    );
  }

  #[tokio::test]
  async fn memory_save_does_not_write() {
    let environment = TestEnvironment::new();
    let host = create_host(&environment, "{}");
    let buffer = Buffer::new_unsaved(PathBuf::from("/a.rs"), "rust".to_string(), "a".to_string(), SaveTarget::Memory);
    host.save_document(&buffer).await.unwrap();
    assert!(!buffer.is_dirty());
    assert_eq!(environment.get_file_text("/a.rs"), None);
  }
}
