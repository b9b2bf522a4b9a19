use anyhow::Result;
use anyhow::bail;
use clap::ArgMatches;
use thiserror::Error;

pub struct CliArgs {
  pub sub_command: SubCommand,
  pub verbose: bool,
  pub workspace: Option<String>,
}

impl CliArgs {
  pub fn is_stdout_machine_readable(&self) -> bool {
    // the formatted text goes to stdout
    matches!(self.sub_command, SubCommand::StdInFmt(..))
  }

  fn new_with_sub_command(sub_command: SubCommand) -> CliArgs {
    CliArgs {
      sub_command,
      verbose: false,
      workspace: None,
    }
  }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubCommand {
  Fmt(FmtSubCommand),
  StdInFmt(StdInFmtSubCommand),
  RunCommand(RunCommandSubCommand),
  Commands,
  Resolve(ResolveSubCommand),
  CheckConflicts(CheckConflictsSubCommand),
  Version,
  Help(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct FmtSubCommand {
  pub file_path: String,
  pub language_id: Option<String>,
  pub range: Option<TextRange>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct StdInFmtSubCommand {
  pub file_path: String,
  pub language_id: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RunCommandSubCommand {
  pub command_id: String,
  pub file_path: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ResolveSubCommand {
  pub language_id: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CheckConflictsSubCommand {
  pub watch: bool,
}

/// Byte range of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
  pub start: usize,
  pub end: usize,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ParseArgsError(#[from] anyhow::Error);

pub fn parse_args(args: Vec<String>) -> Result<CliArgs, ParseArgsError> {
  inner_parse_args(args).map_err(ParseArgsError)
}

fn inner_parse_args(args: Vec<String>) -> Result<CliArgs> {
  if args.len() == 1 || (args.len() == 2 && (args[1] == "help" || args[1] == "--help")) {
    let mut cli_parser = create_cli_parser(CliArgParserKind::ForOutputtingMainHelp);
    cli_parser.try_get_matches_from_mut(vec![""])?;
    let help_text = format!("{}", cli_parser.render_help());
    return Ok(CliArgs::new_with_sub_command(SubCommand::Help(help_text)));
  } else if args.len() == 2 && (args[1] == "-v" || args[1] == "-V" || args[1] == "--version") {
    return Ok(CliArgs::new_with_sub_command(SubCommand::Version));
  }

  let cli_parser = create_cli_parser(CliArgParserKind::Default);
  let matches = cli_parser.try_get_matches_from(&args)?;

  let sub_command = match matches.subcommand() {
    Some(("fmt", matches)) => SubCommand::Fmt(FmtSubCommand {
      file_path: get_required_string(matches, "file")?,
      language_id: matches.get_one::<String>("language").map(String::from),
      range: match matches.get_one::<String>("range") {
        Some(range) => Some(parse_range(range)?),
        None => None,
      },
    }),
    Some(("stdin-fmt", matches)) => SubCommand::StdInFmt(StdInFmtSubCommand {
      file_path: get_required_string(matches, "file")?,
      language_id: matches.get_one::<String>("language").map(String::from),
    }),
    Some(("run-command", matches)) => SubCommand::RunCommand(RunCommandSubCommand {
      command_id: get_required_string(matches, "command-id")?,
      file_path: matches.get_one::<String>("file").map(String::from),
    }),
    Some(("commands", _)) => SubCommand::Commands,
    Some(("resolve", matches)) => SubCommand::Resolve(ResolveSubCommand {
      language_id: get_required_string(matches, "language")?,
    }),
    Some(("check-conflicts", matches)) => SubCommand::CheckConflicts(CheckConflictsSubCommand {
      watch: matches.get_flag("watch"),
    }),
    Some(("version", _)) => SubCommand::Version,
    _ => bail!("Unknown sub command."),
  };

  Ok(CliArgs {
    sub_command,
    verbose: matches.get_flag("verbose"),
    workspace: matches.get_one::<String>("workspace").map(String::from),
  })
}

fn get_required_string(matches: &ArgMatches, id: &str) -> Result<String> {
  match matches.get_one::<String>(id) {
    Some(value) => Ok(value.to_string()),
    None => bail!("Missing required argument: {}", id),
  }
}

/// Parses `<start>:<end>` byte offsets.
fn parse_range(text: &str) -> Result<TextRange> {
  let Some((start, end)) = text.split_once(':') else {
    bail!("Invalid range '{}'. Expected <start>:<end>.", text);
  };
  let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>()) else {
    bail!("Invalid range '{}'. Expected <start>:<end>.", text);
  };
  if start > end {
    bail!("Invalid range '{}'. The start must not be after the end.", text);
  }
  Ok(TextRange { start, end })
}

#[derive(Default, PartialEq, Eq)]
pub enum CliArgParserKind {
  ForOutputtingMainHelp,
  #[default]
  Default,
}

pub fn create_cli_parser(kind: CliArgParserKind) -> clap::Command {
  use clap::Arg;
  use clap::Command;

  let mut app = Command::new("chainfmt");

  // hack to get this to display the way I want
  app = if kind == CliArgParserKind::ForOutputtingMainHelp {
    app.disable_help_subcommand(true).disable_version_flag(true).disable_help_flag(true)
  } else {
    app.subcommand_required(true)
  };

  app = app
    .bin_name("chainfmt")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Runs a chain of formatters over a document and produces a single edit.")
    .override_usage("chainfmt <SUBCOMMAND> [OPTIONS]")
    .help_template(r#"{bin} {version}

{about}

USAGE:
    {usage}

SUBCOMMANDS:
{subcommands}

More details at `chainfmt help <SUBCOMMAND>`

OPTIONS:
{options}

ENVIRONMENT VARIABLES:
  CHAINFMT_GLOBAL_SETTINGS  Path to the global settings file. Defaults to
                            chainfmt/settings.json in the config directory.{after-help}"#)
    .after_help(
            r#"GETTING STARTED:
  1. Create .chainfmt/settings.json in the root directory of a workspace.
  2. Add the formatters to run:

       {
         "chainfmt.formatters": ["eslint"],
         "chainfmt.formatterCommands": {
           "eslint": { "command": "eslint_d", "args": ["--fix-to-stdout", "--stdin"] }
         }
       }

  3. Run `chainfmt fmt <file>`.

EXAMPLES:
  Format a file and write the result to the file system:

    chainfmt fmt src/main.ts

  Format stdin as a file and output the result to stdout:

    cat src/main.ts | chainfmt stdin-fmt src/main.ts

  Show the formatters that would run for a language:

    chainfmt resolve typescript"#,
    )
    .subcommand(
      Command::new("fmt")
        .about("Formats a file with its language's formatter chain and writes the result to the file system.")
        .long_about(concat!(
          "Formats a file with its language's formatter chain and writes the result to the file system.\n\n",
          "The file's text is treated as an unsaved edit, so the chain always runs. ",
          "Running it again on already formatted text reports that there were no changes."
        ))
        .add_file_arg()
        .add_language_arg()
        .arg(
          Arg::new("range")
            .long("range")
            .value_name("start:end")
            .help("Byte range of a selection to format. The whole document is formatted.")
            .num_args(1)
        )
    )
    .subcommand(
      Command::new("stdin-fmt")
        .about("Formats stdin as the provided file and outputs the result to stdout.")
        .long_about(concat!(
          "Formats stdin as the provided file and outputs the result to stdout.\n\n",
          "The text is treated as an unsaved edit, so the chain always runs. ",
          "Formatters that rewrite files on disk are skipped."
        ))
        .add_file_arg()
        .add_language_arg()
    )
    .subcommand(
      Command::new("run-command")
        .about("Runs one of the commands listed by `chainfmt commands`.")
        .arg(Arg::new("command-id").required(true).num_args(1))
        .arg(Arg::new("file").required(false).num_args(1))
    )
    .subcommand(
      Command::new("commands")
        .about("Lists the available commands.")
    )
    .subcommand(
      Command::new("resolve")
        .about("Prints the formatter chain and options resolved for a language.")
        .arg(Arg::new("language").required(true).num_args(1))
    )
    .subcommand(
      Command::new("check-conflicts")
        .about("Checks for languages the host formats on save with its own formatter.")
        .arg(
          Arg::new("watch")
            .long("watch")
            .help("Keeps checking whenever a settings file changes.")
            .num_args(0)
        )
    )
    .subcommand(
      Command::new("version")
        .about("Outputs the version.")
    )
    .arg(
      Arg::new("workspace")
        .long("workspace")
        .value_name("dir")
        .help("Root directory of the workspace. Defaults to the current working directory.")
        .global(true)
        .num_args(1)
    )
    .arg(
      Arg::new("verbose")
        .long("verbose")
        .help("Prints additional diagnostic information.")
        .global(true)
        .num_args(0)
    );

  app
}

trait ClapExtensions {
  fn add_file_arg(self) -> Self;
  fn add_language_arg(self) -> Self;
}

impl ClapExtensions for clap::Command {
  fn add_file_arg(self) -> Self {
    self.arg(clap::Arg::new("file").help("Path of the file to format.").required(true).num_args(1))
  }

  fn add_language_arg(self) -> Self {
    self.arg(
      clap::Arg::new("language")
        .long("language")
        .value_name("id")
        .help("Language id of the file. Detected from the file extension when not provided.")
        .num_args(1),
    )
  }
}
