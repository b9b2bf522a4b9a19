use std::path::Path;
use std::path::PathBuf;

use anyhow::Result;
use anyhow::bail;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::CommandRegistry;
use super::EditorCommand;
use super::Workspace;
use super::resolve_path;
use super::toggle_debug_mode;
use crate::app_state::AppState;
use crate::arg_parser::TextRange;
use crate::configuration::Settings;
use crate::configuration::detect_language_id;
use crate::configuration::resolve_chain;
use crate::configuration::resolve_run_options;
use crate::environment::Environment;
use crate::environment::NotificationKind;
use crate::host::Buffer;
use crate::host::EditorHost;
use crate::host::FormatterRegistry;
use crate::host::HostDocument;
use crate::host::LocalHost;
use crate::host::SaveTarget;
use crate::pipeline::EditResult;
use crate::pipeline::PipelineExecutor;
use crate::pipeline::RunReport;
use crate::pipeline::SkipReason;

#[derive(Debug, Error)]
#[error("Formatting {} stopped{}. {message}", .file_path.display(), .formatter_id.as_ref().map(|id| format!(" at '{}'", id)).unwrap_or_default())]
pub struct RunFailedError {
  pub file_path: PathBuf,
  pub formatter_id: Option<String>,
  pub message: String,
}

/// What the formatting commands need.
pub struct FormatContext<'a, TEnvironment: Environment> {
  pub environment: &'a TEnvironment,
  pub app_state: &'a AppState<TEnvironment>,
  pub workspace: &'a Workspace,
  pub token: &'a CancellationToken,
  pub create_registry: &'a dyn Fn(&Settings) -> FormatterRegistry,
}

/// Formats a file and writes the result to the file system.
pub async fn format_file<TEnvironment: Environment>(
  context: &FormatContext<'_, TEnvironment>,
  file_path: &str,
  language_id: Option<&str>,
) -> Result<()> {
  let environment = context.environment;
  let file_path = resolve_path(environment, file_path);
  let file_text = environment.read_file(&file_path)?;
  let (settings, _) = context.workspace.load_settings(environment, Some(&file_path))?;
  let Some(language_id) = get_language_id(environment, &settings, &file_path, language_id) else {
    return Ok(());
  };

  // the file's text is the pending edit
  let document = Buffer::new_unsaved(file_path, language_id, file_text, SaveTarget::Disk);
  let host = LocalHost::new(environment.clone(), settings.clone(), (context.create_registry)(&settings));
  let report = run_chain(context, &host, &document).await;
  if matches!(report.edit, EditResult::Replace(_)) && document.is_dirty() {
    // the host applies the final edit even when not saving after the chain
    host.save_document(&document).await?;
  }
  report_run(environment, &document, &report)
}

/// Formats the whole document. There is no range formatting.
pub async fn format_selection<TEnvironment: Environment>(
  context: &FormatContext<'_, TEnvironment>,
  file_path: &str,
  language_id: Option<&str>,
  range: Option<TextRange>,
) -> Result<()> {
  if let Some(range) = range {
    log_debug!(context.environment, "Ignoring selection {}:{}.", range.start, range.end);
  }
  context
    .environment
    .notify(NotificationKind::Info, "Range formatting is not supported. Formatting the whole document.");
  format_file(context, file_path, language_id).await
}

/// Formats stdin as the provided file and outputs the result to stdout.
pub async fn stdin_format<TEnvironment: Environment>(
  context: &FormatContext<'_, TEnvironment>,
  file_path: &str,
  language_id: Option<&str>,
) -> Result<()> {
  let environment = context.environment;
  let file_path = resolve_path(environment, file_path);
  let file_text = environment.read_stdin()?;
  let (settings, _) = context.workspace.load_settings(environment, Some(&file_path))?;
  let Some(language_id) = get_language_id(environment, &settings, &file_path, language_id) else {
    environment.write_stdout(&file_text);
    return Ok(());
  };

  let mut registry = (context.create_registry)(&settings);
  for id in registry.retain(|formatter| !formatter.operates_on_disk()) {
    log_warn!(environment, "Formatter '{}' formats files on disk and can't be used when formatting stdin.", id);
  }
  let document = Buffer::new_unsaved(file_path, language_id, file_text, SaveTarget::Memory);
  let host = LocalHost::new(environment.clone(), settings.clone(), registry);
  let report = run_chain(context, &host, &document).await;
  environment.write_stdout(&document.text());
  report_run(environment, &document, &report)
}

/// Runs one of the commands in the command registry.
pub async fn run_editor_command<TEnvironment: Environment>(
  context: &FormatContext<'_, TEnvironment>,
  command_id: &str,
  file_path: Option<&str>,
) -> Result<()> {
  let environment = context.environment;
  let (settings, _) = context.workspace.load_settings(environment, None)?;
  let registry = CommandRegistry::from_settings(&settings, environment);
  let Some(command) = registry.find(command_id) else {
    bail!("Unknown command '{}'. Run `chainfmt commands` to see the available commands.", command_id);
  };
  log_debug!(environment, "Running command {}", command_id);

  if *command == EditorCommand::ToggleDebugMode {
    toggle_debug_mode(environment, &settings);
    return Ok(());
  }
  let Some(file_path) = file_path else {
    environment.notify(NotificationKind::Info, "There is no document to format.");
    return Ok(());
  };
  match command {
    EditorCommand::FormatDocument => format_file(context, file_path, None).await,
    EditorCommand::FormatSelection => format_selection(context, file_path, None, None).await,
    EditorCommand::FormatDocumentAs(language_id) => format_file(context, file_path, Some(language_id.as_str())).await,
    EditorCommand::ToggleDebugMode => Ok(()),
  }
}

fn get_language_id(environment: &impl Environment, settings: &Settings, file_path: &Path, language_id: Option<&str>) -> Option<String> {
  if let Some(language_id) = language_id {
    return Some(language_id.to_string());
  }
  let language_id = detect_language_id(settings, file_path, environment);
  if language_id.is_none() {
    environment.notify(
      NotificationKind::Info,
      &format!("Could not determine the language of {}. Provide it with --language.", file_path.display()),
    );
  }
  language_id
}

async fn run_chain<TEnvironment: Environment>(
  context: &FormatContext<'_, TEnvironment>,
  host: &LocalHost<TEnvironment>,
  document: &Buffer,
) -> RunReport {
  let environment = context.environment;
  let settings = host.settings();
  let chain = resolve_chain(settings, document.language_id(), environment);
  let options = resolve_run_options(settings, document.language_id(), environment);
  PipelineExecutor::new(environment, host, context.app_state.recursion_guard())
    .run(document, &chain, &options, context.token)
    .await
}

/// Notifies about the outcome of a run.
fn report_run(environment: &impl Environment, document: &Buffer, report: &RunReport) -> Result<()> {
  let file_path = document.file_path();
  for step in &report.steps {
    log_debug!(
      environment,
      "{}: {}{}",
      step.formatter_id,
      if step.changed { "changed" } else { "unchanged" },
      if step.confirmed { "" } else { " (activation unconfirmed)" }
    );
  }
  for step in report.failed_steps() {
    if let Some(error) = &step.error {
      environment.notify(NotificationKind::Error, &format!("Formatter '{}' failed. {}", step.formatter_id, error));
    }
  }
  if report.cancelled {
    environment.notify(NotificationKind::Warning, &format!("Formatting {} was cancelled.", file_path.display()));
  }
  if let Some(failure) = &report.failure {
    let err = RunFailedError {
      file_path: file_path.to_path_buf(),
      formatter_id: failure.formatter_id.clone(),
      message: failure.message.clone(),
    };
    environment.notify(NotificationKind::Error, &err.to_string());
    return Err(err.into());
  }
  match &report.edit {
    // logged by the executor
    EditResult::Skipped(SkipReason::AlreadyRunning | SkipReason::EmptyChain) => {}
    EditResult::Skipped(SkipReason::NotDirty) => {
      environment.notify(NotificationKind::Info, &format!("Nothing to format in {}.", file_path.display()));
    }
    EditResult::NoChanges => {
      environment.notify(NotificationKind::Info, &format!("No changes to {}.", file_path.display()));
    }
    EditResult::Replace(_) => {
      environment.notify(NotificationKind::Info, &format!("Formatted {}.", file_path.display()));
    }
  }
  Ok(())
}
