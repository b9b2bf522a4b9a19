use std::future::Future;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
  Info,
  Warning,
  Error,
}

pub trait Environment: Clone + 'static {
  fn read_file(&self, file_path: &Path) -> Result<String>;
  fn write_file(&self, file_path: &Path, file_text: &str) -> Result<()>;
  fn path_exists(&self, file_path: &Path) -> bool;
  /// Whether the file exists and can't be written to.
  fn is_read_only(&self, file_path: &Path) -> bool;
  fn cwd(&self) -> PathBuf;
  /// Path to the global settings file when one can be determined.
  fn global_settings_path(&self) -> Option<PathBuf>;
  fn read_stdin(&self) -> Result<String>;
  /// Writes a line meant for a person. Goes to stderr when stdout is machine readable.
  fn log(&self, text: &str);
  /// Writes the text to stdout as is. This is where the machine readable output goes.
  fn write_stdout(&self, text: &str);
  fn log_stderr(&self, text: &str) {
    self.log_stderr_with_context(text, "chainfmt");
  }
  /// Logs to stderr providing the context name.
  /// The context name is output when it differs from the previous line.
  fn log_stderr_with_context(&self, text: &str, context_name: &str);
  /// Shows a transient message to the person using the tool.
  fn notify(&self, kind: NotificationKind, text: &str);
  fn is_verbose(&self) -> bool;
  fn set_verbose(&self, value: bool);
  fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

// use a macro here so the expression provided is only evaluated when in verbose mode
macro_rules! log_debug {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.is_verbose() {
      let mut text = String::from("[DEBUG] ");
      text.push_str(&format!($($arg)*));
      $environment.log_stderr(&text);
    }
  }
}

macro_rules! log_warn {
  ($environment:expr, $($arg:tt)*) => {
    {
      let mut text = String::from("[WARN] ");
      text.push_str(&format!($($arg)*));
      $environment.log_stderr(&text);
    }
  }
}

macro_rules! log_error {
  ($environment:expr, $($arg:tt)*) => {
    {
      let mut text = String::from("[ERROR] ");
      text.push_str(&format!($($arg)*));
      $environment.log_stderr(&text);
    }
  }
}

macro_rules! log_info {
  ($environment:expr, $($arg:tt)*) => {
    $environment.log_stderr(&format!($($arg)*))
  }
}
