use chrono::DateTime;
use chrono::Utc;
use parking_lot::Mutex;
use std::io::Stderr;
use std::io::Stdout;
use std::io::Write;
use std::io::stderr;
use std::io::stdout;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

#[derive(Clone)]
pub struct LoggerOptions {
  pub initial_context_name: String,
  /// Whether stdout will be read by a program.
  pub is_stdout_machine_readable: bool,
  pub is_verbose: bool,
}

/// Operational log stream. Every stderr line is prefixed with a UTC
/// timestamp so the sequence of pipeline transitions can be followed.
#[derive(Clone)]
pub struct Logger {
  output_lock: Arc<Mutex<LoggerState>>,
  is_stdout_machine_readable: bool,
  is_verbose: Arc<AtomicBool>,
}

struct LoggerState {
  last_context_name: String,
  std_out: Stdout,
  std_err: Stderr,
}

impl Logger {
  pub fn new(options: &LoggerOptions) -> Self {
    Logger {
      output_lock: Arc::new(Mutex::new(LoggerState {
        last_context_name: options.initial_context_name.clone(),
        std_out: stdout(),
        std_err: stderr(),
      })),
      is_stdout_machine_readable: options.is_stdout_machine_readable,
      is_verbose: Arc::new(AtomicBool::new(options.is_verbose)),
    }
  }

  #[inline]
  pub fn is_verbose(&self) -> bool {
    self.is_verbose.load(Ordering::Relaxed)
  }

  pub fn set_verbose(&self, value: bool) {
    self.is_verbose.store(value, Ordering::Relaxed);
  }

  pub fn log(&self, text: &str) {
    let mut state = self.output_lock.lock();
    if self.is_stdout_machine_readable {
      // keep stdout for the program reading it
      let _ = writeln!(state.std_err, "{}", text);
      let _ = state.std_err.flush();
    } else {
      let _ = writeln!(state.std_out, "{}", text);
      let _ = state.std_out.flush();
    }
  }

  /// Writes the text to stdout exactly as provided.
  pub fn write_stdout(&self, text: &str) {
    let mut state = self.output_lock.lock();
    let _ = state.std_out.write_all(text.as_bytes());
    let _ = state.std_out.flush();
  }

  pub fn log_stderr(&self, text: &str) {
    self.log_stderr_with_context(text, "chainfmt");
  }

  pub fn log_stderr_with_context(&self, text: &str, context_name: &str) {
    let mut state = self.output_lock.lock();
    let timestamp = format_timestamp(Utc::now());
    let mut output = String::new();
    if state.last_context_name != context_name {
      output.push_str(&format!("[{}] [{}]\n", timestamp, context_name));
      state.last_context_name = context_name.to_string();
    }
    for line in text.lines() {
      output.push_str(&format!("[{}] {}\n", timestamp, line));
    }
    if text.is_empty() {
      output.push_str(&format!("[{}]\n", timestamp));
    }
    let _ = state.std_err.write_all(output.as_bytes());
    let _ = state.std_err.flush();
  }
}

/// Formats the time of day as `HH:MM:SS.mmm` in UTC.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
  time.format("%H:%M:%S%.3f").to_string()
}
