use anyhow::Result;
use serde_json::Value;

use super::CommandRegistry;
use super::Workspace;
use crate::configuration::DEBUG_KEY;
use crate::configuration::FORMAT_ON_SAVE_KEY;
use crate::configuration::Settings;
use crate::configuration::get_language_family;
use crate::configuration::is_language_enabled;
use crate::configuration::resolve_chain;
use crate::configuration::resolve_run_options;
use crate::environment::Environment;
use crate::environment::NotificationKind;
use crate::host::create_formatter_registry;

pub fn output_version(environment: &impl Environment) -> Result<()> {
  environment.log(&format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
  Ok(())
}

pub fn output_help(environment: &impl Environment, help_text: &str) -> Result<()> {
  environment.log(help_text);
  Ok(())
}

pub fn output_commands(environment: &impl Environment, workspace: &Workspace) -> Result<()> {
  let (settings, _) = workspace.load_settings(environment, None)?;
  let registry = CommandRegistry::from_settings(&settings, environment);
  let commands = registry.commands().iter().map(|command| (command.id(), command.description())).collect::<Vec<_>>();
  let id_width = commands.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
  for (id, description) in commands {
    environment.log(&format!("{:width$}  {}", id, description, width = id_width));
  }
  Ok(())
}

/// Outputs the chain and run options resolved for a language.
pub fn output_resolution(environment: &impl Environment, workspace: &Workspace, language_id: &str) -> Result<()> {
  let (settings, _) = workspace.load_settings(environment, None)?;
  let chain = resolve_chain(&settings, language_id, environment);
  let options = resolve_run_options(&settings, language_id, environment);
  let family = get_language_family(&settings, language_id, environment);
  let format_on_save = settings.get::<bool>(FORMAT_ON_SAVE_KEY, Some(language_id)).ok().flatten().unwrap_or(false);

  environment.log(&format!("language: {}", language_id));
  environment.log(&format!("family: {}", family.as_deref().unwrap_or("(none)")));
  environment.log(&format!("enabled: {}", is_language_enabled(&settings, language_id, environment)));
  environment.log(&format!("chain: {}", chain));
  environment.log(&format!("formatterDelay: {}ms", options.delay.as_millis()));
  environment.log(&format!("saveAfterEachFormatter: {}", options.save_after_each));
  environment.log(&format!("saveAfterChain: {}", options.save_after_chain));
  environment.log(&format!(
    "activation: {} attempts every {}ms",
    options.activation.attempts,
    options.activation.interval.as_millis()
  ));
  environment.log(&format!("formatOnSave: {}", format_on_save));
  let registry = create_formatter_registry(&settings, environment);
  let command_ids = registry.ids().collect::<Vec<_>>();
  environment.log(&format!(
    "formatterCommands: {}",
    if command_ids.is_empty() { "(none)".to_string() } else { command_ids.join(", ") }
  ));
  Ok(())
}

/// Flips debug output for the rest of the process and records it in the
/// narrowest settings scope.
pub fn toggle_debug_mode(environment: &impl Environment, settings: &Settings) {
  let is_enabled = !environment.is_verbose();
  environment.set_verbose(is_enabled);
  if let Some(scope) = settings.narrowest_scope()
    && let Err(err) = settings.set_raw(scope, DEBUG_KEY, None, Some(Value::Bool(is_enabled)))
  {
    log_warn!(environment, "Could not update {}. {}", DEBUG_KEY, err);
  }
  let message = if is_enabled { "Debug mode enabled." } else { "Debug mode disabled." };
  log_info!(environment, "{}", message);
  environment.notify(NotificationKind::Info, message);
}

#[cfg(test)]
mod test {
  use std::path::PathBuf;

  use pretty_assertions::assert_eq;

  use super::*;
  use crate::environment::TestEnvironment;

  fn workspace() -> Workspace {
    Workspace {
      root: PathBuf::from("/project"),
    }
  }

  #[test]
  fn outputs_commands() {
    let environment = TestEnvironment::new();
    environment.add_file("/project/.chainfmt/settings.json", r#"{ "chainfmt.languages": ["go"] }"#);
    output_commands(&environment, &workspace()).unwrap();
    assert_eq!(
      environment.take_stdout_messages(),
      vec![
        "chainfmt.formatDocument     Format the document with its language's formatter chain.",
        "chainfmt.formatSelection    Format the selection (formats the whole document).",
        "chainfmt.formatDocument.go  Format the document with the go formatter chain.",
        "chainfmt.toggleDebugMode    Toggle debug output.",
      ]
    );
  }

  #[test]
  fn outputs_resolution() {
    let environment = TestEnvironment::new();
    environment.add_file(
      "/config/chainfmt/settings.json",
      r#"{ "chainfmt.formatters": ["prettier"], "[typescript]": { "editor.defaultFormatter": "host.ts" } }"#,
    );
    environment.add_file(
      "/project/.chainfmt/settings.json",
      r#"{ "[typescript]": { "chainfmt.formatters": ["eslint", "chainfmt"], "editor.formatOnSave": true }, "chainfmt.formatterDelay": 1 }"#,
    );
    output_resolution(&environment, &workspace(), "typescriptreact").unwrap();
    assert_eq!(
      environment.take_stdout_messages(),
      vec![
        "language: typescriptreact",
        "family: typescript",
        "enabled: true",
        "chain: eslint",
        "formatterDelay: 10ms",
        "saveAfterEachFormatter: false",
        "saveAfterChain: true",
        "activation: 10 attempts every 20ms",
        "formatOnSave: false",
        "formatterCommands: (none)",
      ]
    );
  }

  #[test]
  fn toggles_debug_mode() {
    let environment = TestEnvironment::new();
    let settings = Settings::new().with_layer(crate::configuration::SettingsScope::Workspace, Default::default());
    toggle_debug_mode(&environment, &settings);
    assert!(!environment.is_verbose());
    assert_eq!(settings.get::<bool>(DEBUG_KEY, None).unwrap(), Some(false));
    toggle_debug_mode(&environment, &settings);
    assert!(environment.is_verbose());
    assert_eq!(
      environment.take_notifications(),
      vec![
        (NotificationKind::Info, "Debug mode disabled.".to_string()),
        (NotificationKind::Info, "Debug mode enabled.".to_string()),
      ]
    );
  }
}
