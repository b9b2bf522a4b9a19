use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use super::FormatOutput;
use super::FormatRequest;
use super::Formatter;
use super::FormatterRegistry;
use crate::configuration::FORMATTER_COMMANDS_KEY;
use crate::configuration::Settings;
use crate::environment::Environment;
use crate::pipeline::is_reserved_id;

const FILE_PLACEHOLDER: &str = "{{file}}";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration of an external formatter command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatterCommandConfig {
  pub command: String,
  #[serde(default)]
  pub args: Vec<String>,
  /// Send the text on stdin and read the result from stdout. Otherwise the
  /// command rewrites the saved file in place.
  #[serde(default = "default_stdin")]
  pub stdin: bool,
  pub cwd: Option<PathBuf>,
  /// Milliseconds before the command is killed.
  pub timeout: Option<u64>,
}

fn default_stdin() -> bool {
  true
}

pub struct ProcessFormatter {
  id: String,
  config: FormatterCommandConfig,
}

impl ProcessFormatter {
  pub fn new(id: String, config: FormatterCommandConfig) -> Self {
    Self { id, config }
  }

  fn get_args(&self, file_path: &Path) -> Vec<String> {
    let file_path = file_path.to_string_lossy();
    self.config.args.iter().map(|arg| arg.replace(FILE_PLACEHOLDER, &file_path)).collect()
  }

  fn get_cwd(&self, file_path: &Path) -> Option<PathBuf> {
    self.config.cwd.clone().or_else(|| file_path.parent().map(|parent| parent.to_path_buf()))
  }
}

#[async_trait(?Send)]
impl Formatter for ProcessFormatter {
  fn id(&self) -> &str {
    &self.id
  }

  fn operates_on_disk(&self) -> bool {
    !self.config.stdin
  }

  async fn format_text(&self, request: FormatRequest) -> Result<FormatOutput> {
    let mut command = tokio::process::Command::new(&self.config.command);
    command
      .args(self.get_args(&request.file_path))
      .stdin(if self.config.stdin { Stdio::piped() } else { Stdio::null() })
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);
    if let Some(cwd) = self.get_cwd(&request.file_path)
      && cwd.is_dir()
    {
      command.current_dir(cwd);
    }
    let mut child = command
      .spawn()
      .with_context(|| format!("Error starting '{}' for formatter '{}'.", self.config.command, self.id))?;

    let stdin = child.stdin.take();
    let file_text = request.file_text.as_bytes();
    let write_stdin = async move {
      if let Some(mut stdin) = stdin {
        stdin.write_all(file_text).await?;
        stdin.shutdown().await?;
      }
      Ok::<_, std::io::Error>(())
    };
    let timeout = Duration::from_millis(self.config.timeout.unwrap_or(DEFAULT_TIMEOUT_MS));
    let (write_result, output) = tokio::join!(write_stdin, tokio::time::timeout(timeout, child.wait_with_output()));
    let output = match output {
      Ok(output) => output.with_context(|| format!("Error running formatter '{}'.", self.id))?,
      Err(_) => bail!("Formatter '{}' timed out after {}ms.", self.id, timeout.as_millis()),
    };
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      bail!(
        "Formatter '{}' exited with {}.{}",
        self.id,
        output.status,
        if stderr.trim().is_empty() {
          String::new()
        } else {
          format!("\n{}", stderr.trim_end())
        }
      );
    }
    write_result.with_context(|| format!("Error writing to stdin of formatter '{}'.", self.id))?;

    if !self.config.stdin {
      return Ok(FormatOutput::FileUpdated);
    }
    let text = String::from_utf8(output.stdout).with_context(|| format!("Formatter '{}' output was not valid UTF-8.", self.id))?;
    if text == request.file_text {
      Ok(FormatOutput::Unchanged)
    } else {
      Ok(FormatOutput::Text(text))
    }
  }
}

/// Creates process formatters from the configured commands.
pub fn create_formatter_registry(settings: &Settings, environment: &impl Environment) -> FormatterRegistry {
  let mut registry = FormatterRegistry::default();
  let commands = match settings.get::<IndexMap<String, FormatterCommandConfig>>(FORMATTER_COMMANDS_KEY, None) {
    Ok(commands) => commands.unwrap_or_default(),
    Err(err) => {
      log_warn!(environment, "{:#}", err);
      return registry;
    }
  };
  for (id, config) in commands {
    if is_reserved_id(&id) {
      log_warn!(environment, "Ignoring formatter command with reserved id '{}'.", id);
      continue;
    }
    log_debug!(environment, "Registered formatter '{}' ({}).", id, config.command);
    registry.register(Rc::new(ProcessFormatter::new(id, config)));
  }
  registry
}
