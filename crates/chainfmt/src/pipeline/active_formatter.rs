use serde_json::Value;

use crate::configuration::DEFAULT_FORMATTER_KEY;
use crate::configuration::Settings;
use crate::configuration::SettingsScope;
use crate::configuration::SettingsWriteError;

/// The host's "active formatter" setting for one language, owned by a run.
///
/// Acquiring captures the raw value at the narrowest available scope.
/// The captured value is written back by `restore`, or on drop when the run
/// ended without reaching it (ex. the run's future was dropped).
pub struct ActiveFormatterSlot {
  settings: Settings,
  scope: SettingsScope,
  language_id: String,
  original: Option<Value>,
  modified: bool,
}

impl ActiveFormatterSlot {
  pub fn acquire(settings: &Settings, language_id: &str) -> Result<Self, SettingsWriteError> {
    let scope = settings.narrowest_scope().ok_or(SettingsWriteError::NoScopes)?;
    Ok(Self {
      settings: settings.clone(),
      scope,
      language_id: language_id.to_string(),
      original: settings.get_raw(scope, DEFAULT_FORMATTER_KEY, Some(language_id)),
      modified: false,
    })
  }

  pub fn scope(&self) -> SettingsScope {
    self.scope
  }

  pub fn original(&self) -> Option<&Value> {
    self.original.as_ref()
  }

  pub async fn activate(&mut self, formatter_id: &str) -> Result<(), SettingsWriteError> {
    self
      .settings
      .update(self.scope, DEFAULT_FORMATTER_KEY, Some(&self.language_id), Some(Value::String(formatter_id.to_string())))
      .await?;
    self.modified = true;
    Ok(())
  }

  /// Reads back the effective active formatter for the language.
  pub fn active_formatter(&self) -> Option<String> {
    match self.settings.get_value(DEFAULT_FORMATTER_KEY, Some(&self.language_id)) {
      Some(Value::String(value)) => Some(value),
      _ => None,
    }
  }

  pub fn is_active(&self, formatter_id: &str) -> bool {
    self.active_formatter().as_deref() == Some(formatter_id)
  }

  pub async fn restore(mut self) -> Result<(), SettingsWriteError> {
    if self.modified {
      tokio::task::yield_now().await;
    }
    self.restore_now()
  }

  fn restore_now(&mut self) -> Result<(), SettingsWriteError> {
    if !self.modified {
      return Ok(());
    }
    self.modified = false;
    self.settings.set_raw(self.scope, DEFAULT_FORMATTER_KEY, Some(&self.language_id), self.original.clone())
  }
}

impl Drop for ActiveFormatterSlot {
  fn drop(&mut self) {
    let _ = self.restore_now();
  }
}
