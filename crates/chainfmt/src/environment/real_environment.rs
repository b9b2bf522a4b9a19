use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use crossterm::style::Stylize;

use super::Environment;
use super::NotificationKind;
use crate::utils::Logger;
use crate::utils::LoggerOptions;

pub struct RealEnvironmentOptions {
  pub is_verbose: bool,
  pub is_stdout_machine_readable: bool,
}

#[derive(Clone)]
pub struct RealEnvironment {
  logger: Logger,
}

impl RealEnvironment {
  pub fn new(options: RealEnvironmentOptions) -> Self {
    let logger = Logger::new(&LoggerOptions {
      initial_context_name: "chainfmt".to_string(),
      is_stdout_machine_readable: options.is_stdout_machine_readable,
      is_verbose: options.is_verbose,
    });
    RealEnvironment { logger }
  }
}

impl Environment for RealEnvironment {
  fn read_file(&self, file_path: &Path) -> Result<String> {
    log_debug!(self, "Reading file: {}", file_path.display());
    std::fs::read_to_string(file_path).with_context(|| format!("Error reading file: {}", file_path.display()))
  }

  fn write_file(&self, file_path: &Path, file_text: &str) -> Result<()> {
    log_debug!(self, "Writing file: {}", file_path.display());
    std::fs::write(file_path, file_text).with_context(|| format!("Error writing file: {}", file_path.display()))
  }

  fn path_exists(&self, file_path: &Path) -> bool {
    file_path.exists()
  }

  fn is_read_only(&self, file_path: &Path) -> bool {
    std::fs::metadata(file_path).map(|metadata| metadata.permissions().readonly()).unwrap_or(false)
  }

  fn cwd(&self) -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
  }

  fn global_settings_path(&self) -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CHAINFMT_GLOBAL_SETTINGS") {
      return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("chainfmt").join("settings.json"))
  }

  fn read_stdin(&self) -> Result<String> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text).context("Error reading from stdin.")?;
    Ok(text)
  }

  fn log(&self, text: &str) {
    self.logger.log(text);
  }

  fn write_stdout(&self, text: &str) {
    self.logger.write_stdout(text);
  }

  fn log_stderr_with_context(&self, text: &str, context_name: &str) {
    self.logger.log_stderr_with_context(text, context_name);
  }

  fn notify(&self, kind: NotificationKind, text: &str) {
    let label = match kind {
      NotificationKind::Info => "Info".cyan(),
      NotificationKind::Warning => "Warning".yellow(),
      NotificationKind::Error => "Error".red(),
    };
    self.logger.log_stderr(&format!("{} {}", label.bold(), text));
  }

  fn is_verbose(&self) -> bool {
    self.logger.is_verbose()
  }

  fn set_verbose(&self, value: bool) {
    self.logger.set_verbose(value);
  }

  async fn sleep(&self, duration: Duration) {
    tokio::time::sleep(duration).await
  }
}
