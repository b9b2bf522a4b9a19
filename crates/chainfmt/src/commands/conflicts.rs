use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::Workspace;
use crate::app_state::AppState;
use crate::configuration::get_settings_files_fingerprint;
use crate::configuration::load_settings_layers;
use crate::environment::Environment;

const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
#[error("Found formatting conflicts for: {}", .language_ids.join(", "))]
pub struct ConflictsFoundError {
  pub language_ids: Vec<String>,
}

/// Scans the workspace settings for formatting conflicts. When watching,
/// rescans whenever a settings file changes until cancelled.
pub async fn check_conflicts<TEnvironment: Environment>(
  environment: &TEnvironment,
  app_state: &AppState<TEnvironment>,
  workspace: &Workspace,
  watch: bool,
  token: &CancellationToken,
) -> Result<()> {
  let (settings, paths) = workspace.load_settings(environment, None)?;
  let report = app_state.scan_conflicts(&settings);

  if !watch {
    if report.new_conflicts.is_empty() {
      environment.log("No formatting conflicts found.");
      return Ok(());
    }
    for conflict in &report.new_conflicts {
      environment.log(&format!("{}: {} formats on save", conflict.language_id, conflict.default_formatter));
    }
    return Err(
      ConflictsFoundError {
        language_ids: report.new_conflicts.into_iter().map(|conflict| conflict.language_id).collect(),
      }
      .into(),
    );
  }

  log_info!(environment, "Watching settings files for changes. Press Ctrl+C to stop.");
  let mut fingerprint = get_settings_files_fingerprint(environment, &paths);
  loop {
    tokio::select! {
      _ = token.cancelled() => break,
      _ = environment.sleep(WATCH_POLL_INTERVAL) => {}
    }
    let new_fingerprint = get_settings_files_fingerprint(environment, &paths);
    if !fingerprint.changed(&new_fingerprint) {
      continue;
    }
    fingerprint = new_fingerprint;
    match load_settings_layers(environment, &paths) {
      Ok(layers) => {
        let changed_keys = settings.replace_layers(layers);
        if !changed_keys.is_empty()
          && let Some(report) = app_state.on_configuration_changed(&settings, &changed_keys)
        {
          log_debug!(
            environment,
            "Conflict scan: {} new, {} resolved, {} failed.",
            report.new_conflicts.len(),
            report.resolved.len(),
            report.errored.len()
          );
        }
      }
      Err(err) => log_error!(environment, "{:#}", err),
    }
  }
  Ok(())
}
