use anyhow::Result;
use indexmap::IndexSet;

use crate::configuration::DEFAULT_FORMATTER_KEY;
use crate::configuration::FORMAT_ON_SAVE_KEY;
use crate::configuration::LANGUAGES_KEY;
use crate::configuration::SHOW_CONFLICT_WARNINGS_KEY;
use crate::configuration::Settings;
use crate::configuration::read_or_warn;
use crate::environment::Environment;
use crate::environment::NotificationKind;
use crate::pipeline::RecursionGuard;
use crate::pipeline::is_reserved_id;

const AFFECTING_KEYS: [&str; 4] = [DEFAULT_FORMATTER_KEY, FORMAT_ON_SAVE_KEY, LANGUAGES_KEY, SHOW_CONFLICT_WARNINGS_KEY];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConflict {
  pub language_id: String,
  pub default_formatter: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConflictScanReport {
  /// Languages that started conflicting in this scan.
  pub new_conflicts: Vec<LanguageConflict>,
  /// Languages that stopped conflicting in this scan.
  pub resolved: Vec<String>,
  /// Languages that could not be scanned.
  pub errored: Vec<String>,
}

/// Finds languages where the host would format on save with its own default
/// formatter while this orchestrator is expected to run the chain.
///
/// Only reports transitions. A language stays in the record until a scan
/// finds it no longer conflicts.
pub struct ConflictDetector<TEnvironment: Environment> {
  environment: TEnvironment,
  record: IndexSet<String>,
}

impl<TEnvironment: Environment> ConflictDetector<TEnvironment> {
  pub fn new(environment: TEnvironment) -> Self {
    Self {
      environment,
      record: Default::default(),
    }
  }

  /// Languages with an active conflict as of the last scan.
  pub fn conflicted_languages(&self) -> impl Iterator<Item = &str> {
    self.record.iter().map(|id| id.as_str())
  }

  pub fn is_conflicted(&self, language_id: &str) -> bool {
    self.record.contains(language_id)
  }

  pub fn clear(&mut self) {
    self.record.clear();
  }

  pub fn scan(&mut self, settings: &Settings) -> ConflictScanReport {
    let mut report = ConflictScanReport::default();
    let show_warnings = read_or_warn::<bool>(settings, SHOW_CONFLICT_WARNINGS_KEY, None, &self.environment).unwrap_or(true);
    if !show_warnings {
      if !self.record.is_empty() {
        log_debug!(self.environment, "Conflict warnings are disabled. Clearing {} recorded conflicts.", self.record.len());
      }
      self.record.clear();
      return report;
    }

    let allow_list = read_or_warn::<Vec<String>>(settings, LANGUAGES_KEY, None, &self.environment).unwrap_or_default();
    let language_ids = if allow_list.is_empty() { settings.language_ids() } else { allow_list };
    log_debug!(self.environment, "Scanning {} languages for formatting conflicts.", language_ids.len());

    for language_id in &language_ids {
      let language_id = language_id.clone();
      let conflict = match find_conflict(settings, &language_id) {
        Ok(conflict) => conflict,
        Err(err) => {
          log_error!(self.environment, "Failed checking '{}' for formatting conflicts. {:#}", language_id, err);
          report.errored.push(language_id);
          continue;
        }
      };
      match conflict {
        Some(default_formatter) => {
          if self.record.insert(language_id.clone()) {
            let message = format!(
              "'{}' formats {} files on save, so the formatter chain will not run for them. Disable {} for [{}] or set its {} to chainfmt.",
              default_formatter, language_id, FORMAT_ON_SAVE_KEY, language_id, DEFAULT_FORMATTER_KEY
            );
            log_warn!(self.environment, "{}", message);
            self.environment.notify(NotificationKind::Warning, &message);
            report.new_conflicts.push(LanguageConflict {
              language_id,
              default_formatter,
            });
          }
        }
        None => self.resolve(language_id, &mut report),
      }
    }

    // languages no longer scanned can't conflict
    let unscanned = self
      .record
      .iter()
      .filter(|language_id| !language_ids.contains(language_id))
      .cloned()
      .collect::<Vec<_>>();
    for language_id in unscanned {
      self.resolve(language_id, &mut report);
    }
    report
  }

  fn resolve(&mut self, language_id: String, report: &mut ConflictScanReport) {
    if self.record.shift_remove(&language_id) {
      let message = format!("The formatting conflict for {} files is resolved.", language_id);
      log_info!(self.environment, "{}", message);
      self.environment.notify(NotificationKind::Info, &message);
      report.resolved.push(language_id);
    }
  }

  /// Rescans when a changed key can affect conflicts. Skipped while a run is
  /// in progress because the run's own writes to the active formatter are
  /// temporary.
  pub fn on_configuration_changed(
    &mut self,
    settings: &Settings,
    changed_keys: &[String],
    recursion_guard: &RecursionGuard,
  ) -> Option<ConflictScanReport> {
    if !changed_keys.iter().any(|key| is_affecting_key(key)) {
      return None;
    }
    if recursion_guard.is_held() {
      log_debug!(self.environment, "Formatting in progress. Skipping conflict scan.");
      return None;
    }
    Some(self.scan(settings))
  }
}

/// Gets the offending default formatter when the language conflicts.
fn find_conflict(settings: &Settings, language_id: &str) -> Result<Option<String>> {
  let Some(default_formatter) = settings.get::<String>(DEFAULT_FORMATTER_KEY, Some(language_id))? else {
    return Ok(None);
  };
  if is_reserved_id(&default_formatter) {
    return Ok(None);
  }
  let format_on_save = settings.get::<bool>(FORMAT_ON_SAVE_KEY, Some(language_id))?.unwrap_or(false);
  Ok(if format_on_save { Some(default_formatter) } else { None })
}

fn is_affecting_key(qualified_key: &str) -> bool {
  let key = match qualified_key.rfind("].") {
    Some(index) if qualified_key.starts_with('[') => &qualified_key[index + 2..],
    _ => qualified_key,
  };
  AFFECTING_KEYS.contains(&key)
}
