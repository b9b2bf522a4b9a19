use anyhow::Result;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::app_state::AppState;
use crate::arg_parser::CliArgs;
use crate::arg_parser::ParseArgsError;
use crate::arg_parser::SubCommand;
use crate::commands;
use crate::commands::ConflictsFoundError;
use crate::commands::FormatContext;
use crate::commands::RunFailedError;
use crate::commands::Workspace;
use crate::configuration::Settings;
use crate::configuration::SettingsLoadError;
use crate::environment::Environment;
use crate::host::create_formatter_registry;

#[derive(Debug, Error)]
#[error("{inner:#}")]
pub struct AppError {
  pub inner: anyhow::Error,
  pub exit_code: i32,
}

impl From<anyhow::Error> for AppError {
  fn from(inner: anyhow::Error) -> Self {
    let exit_code = if inner.downcast_ref::<ParseArgsError>().is_some() {
      10
    } else if inner.downcast_ref::<SettingsLoadError>().is_some() {
      11
    } else if inner.downcast_ref::<RunFailedError>().is_some() {
      12
    } else if inner.downcast_ref::<ConflictsFoundError>().is_some() {
      20
    } else {
      1
    };
    AppError { inner, exit_code }
  }
}

impl From<ParseArgsError> for AppError {
  fn from(err: ParseArgsError) -> Self {
    AppError {
      inner: err.into(),
      exit_code: 10,
    }
  }
}

pub async fn run_cli<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment, token: &CancellationToken) -> Result<()> {
  // these don't need any state
  match &args.sub_command {
    SubCommand::Help(help_text) => return commands::output_help(environment, help_text),
    SubCommand::Version => return commands::output_version(environment),
    _ => {}
  }

  let workspace = Workspace::from_args(args, environment);
  log_debug!(environment, "Workspace: {}", workspace.root.display());
  let app_state = AppState::startup(environment.clone());
  let result = run_sub_command(args, environment, &app_state, &workspace, token).await;
  app_state.shutdown();
  result
}

async fn run_sub_command<TEnvironment: Environment>(
  args: &CliArgs,
  environment: &TEnvironment,
  app_state: &AppState<TEnvironment>,
  workspace: &Workspace,
  token: &CancellationToken,
) -> Result<()> {
  let create_registry = |settings: &Settings| create_formatter_registry(settings, environment);
  let context = FormatContext {
    environment,
    app_state,
    workspace,
    token,
    create_registry: &create_registry,
  };
  match &args.sub_command {
    SubCommand::Fmt(cmd) => match cmd.range {
      Some(range) => commands::format_selection(&context, &cmd.file_path, cmd.language_id.as_deref(), Some(range)).await,
      None => commands::format_file(&context, &cmd.file_path, cmd.language_id.as_deref()).await,
    },
    SubCommand::StdInFmt(cmd) => commands::stdin_format(&context, &cmd.file_path, cmd.language_id.as_deref()).await,
    SubCommand::RunCommand(cmd) => commands::run_editor_command(&context, &cmd.command_id, cmd.file_path.as_deref()).await,
    SubCommand::Commands => commands::output_commands(environment, workspace),
    SubCommand::Resolve(cmd) => commands::output_resolution(environment, workspace, &cmd.language_id),
    SubCommand::CheckConflicts(cmd) => commands::check_conflicts(environment, app_state, workspace, cmd.watch, token).await,
    SubCommand::Help(help_text) => commands::output_help(environment, help_text),
    SubCommand::Version => commands::output_version(environment),
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use crate::environment::NotificationKind;
  use crate::environment::TestEnvironment;
  use crate::test_helpers::run_test_cli;

  #[test]
  fn outputs_version() {
    let environment = TestEnvironment::new();
    run_test_cli(vec!["--version"], &environment).unwrap();
    assert_eq!(
      environment.take_stdout_messages(),
      vec![format!("chainfmt {}", env!("CARGO_PKG_VERSION"))]
    );
  }

  #[test]
  fn outputs_help() {
    let environment = TestEnvironment::new();
    run_test_cli(vec![], &environment).unwrap();
    let messages = environment.take_stdout_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("SUBCOMMANDS:"));
    assert!(messages[0].contains("check-conflicts"));
  }

  #[test]
  fn errors_for_invalid_args() {
    let environment = TestEnvironment::new();
    let err = run_test_cli(vec!["fmt", "a.ts", "--range", "x"], &environment).err().unwrap();
    err.assert_exit_code(10);
  }

  #[test]
  fn errors_for_invalid_settings() {
    let environment = TestEnvironment::new();
    environment.add_file("/project/.chainfmt/settings.json", "[1, 2]");
    let err = run_test_cli(vec!["resolve", "rust"], &environment).err().unwrap();
    assert_eq!(
      err.to_string(),
      "Error loading workspace settings at /project/.chainfmt/settings.json. Expected the settings file to contain an object."
    );
    err.assert_exit_code(11);
  }

  #[test]
  fn uses_workspace_arg() {
    let environment = TestEnvironment::new();
    environment.add_file("/other/.chainfmt/settings.json", r#"{ "chainfmt.formatters": ["a", "b"] }"#);
    run_test_cli(vec!["resolve", "go", "--workspace", "/other"], &environment).unwrap();
    let messages = environment.take_stdout_messages();
    assert_eq!(messages[3], "chain: a -> b");
  }

  #[test]
  fn check_conflicts_exit_code() {
    let environment = TestEnvironment::new();
    environment.add_file(
      "/project/.chainfmt/settings.json",
      r#"{ "[go]": { "editor.defaultFormatter": "gofmt", "editor.formatOnSave": true } }"#,
    );
    let err = run_test_cli(vec!["check-conflicts"], &environment).err().unwrap();
    err.assert_exit_code(20);
    assert_eq!(environment.take_notifications()[0].0, NotificationKind::Warning);
  }

  #[test]
  fn read_only_settings_stop_the_run() {
    let environment = TestEnvironment::new();
    environment.add_file("/project/.chainfmt/settings.json", r#"{ "chainfmt.formatters": ["a"] }"#);
    environment.set_read_only("/project/.chainfmt/settings.json");
    environment.add_file("/project/file.ts", "text");
    let err = run_test_cli(vec!["fmt", "file.ts"], &environment).err().unwrap();
    assert_eq!(err.to_string(), "Formatting /project/file.ts stopped at 'a'. The workspace settings are read-only.");
    err.assert_exit_code(12);
    assert_eq!(environment.get_file_text("/project/file.ts"), Some("text".to_string()));
  }

  #[test]
  fn missing_file_errors() {
    let environment = TestEnvironment::new();
    let err = run_test_cli(vec!["fmt", "missing.ts"], &environment).err().unwrap();
    assert_eq!(err.to_string(), "Could not find file at path /project/missing.ts");
    err.assert_exit_code(1);
  }

  #[cfg(unix)]
  #[test]
  fn formats_with_process_formatters() {
    let environment = TestEnvironment::new();
    environment.add_file(
      "/project/.chainfmt/settings.json",
      r#"{
        "chainfmt.formatterDelay": 10,
        "chainfmt.formatters": ["upper", "dashes"],
        "chainfmt.formatterCommands": {
          "upper": { "command": "tr", "args": ["a-z", "A-Z"] },
          "dashes": { "command": "tr", "args": [" ", "-"] }
        }
      }"#,
    );
    environment.set_stdin("hello there world");
    run_test_cli(vec!["stdin-fmt", "notes.md"], &environment).unwrap();
    assert_eq!(environment.take_stdout_messages(), vec!["HELLO-THERE-WORLD".to_string()]);
  }
}
