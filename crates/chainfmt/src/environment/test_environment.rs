use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use anyhow::bail;

use super::Environment;
use super::NotificationKind;

/// In-memory environment. Sleeps complete immediately and are recorded.
#[derive(Clone, Default)]
pub struct TestEnvironment {
  files: Rc<RefCell<HashMap<PathBuf, String>>>,
  read_only_files: Rc<RefCell<HashSet<PathBuf>>>,
  stdin: Rc<RefCell<Option<String>>>,
  logged_messages: Rc<RefCell<Vec<String>>>,
  logged_errors: Rc<RefCell<Vec<String>>>,
  notifications: Rc<RefCell<Vec<(NotificationKind, String)>>>,
  sleeps: Rc<RefCell<Vec<Duration>>>,
  is_verbose: Rc<Cell<bool>>,
}

impl TestEnvironment {
  pub fn new() -> TestEnvironment {
    let environment = TestEnvironment::default();
    environment.is_verbose.set(true);
    environment
  }

  pub fn add_file(&self, file_path: impl AsRef<Path>, text: &str) {
    self.files.borrow_mut().insert(file_path.as_ref().to_path_buf(), text.to_string());
  }

  pub fn get_file_text(&self, file_path: impl AsRef<Path>) -> Option<String> {
    self.files.borrow().get(file_path.as_ref()).cloned()
  }

  pub fn set_read_only(&self, file_path: impl AsRef<Path>) {
    self.read_only_files.borrow_mut().insert(file_path.as_ref().to_path_buf());
  }

  pub fn set_stdin(&self, text: &str) {
    *self.stdin.borrow_mut() = Some(text.to_string());
  }

  pub fn take_stdout_messages(&self) -> Vec<String> {
    self.logged_messages.borrow_mut().drain(..).collect()
  }

  pub fn take_notifications(&self) -> Vec<(NotificationKind, String)> {
    self.notifications.borrow_mut().drain(..).collect()
  }

  pub fn sleeps(&self) -> Vec<Duration> {
    self.sleeps.borrow().clone()
  }

  /// Gets the stderr lines that contain the provided text.
  pub fn stderr_lines_containing(&self, text: &str) -> Vec<String> {
    self.logged_errors.borrow().iter().filter(|line| line.contains(text)).cloned().collect()
  }
}

impl Environment for TestEnvironment {
  fn read_file(&self, file_path: &Path) -> Result<String> {
    match self.files.borrow().get(file_path) {
      Some(text) => Ok(text.clone()),
      None => bail!("Could not find file at path {}", file_path.display()),
    }
  }

  fn write_file(&self, file_path: &Path, file_text: &str) -> Result<()> {
    if self.is_read_only(file_path) {
      bail!("File is read-only: {}", file_path.display());
    }
    self.files.borrow_mut().insert(file_path.to_path_buf(), file_text.to_string());
    Ok(())
  }

  fn path_exists(&self, file_path: &Path) -> bool {
    self.files.borrow().contains_key(file_path)
  }

  fn is_read_only(&self, file_path: &Path) -> bool {
    self.path_exists(file_path) && self.read_only_files.borrow().contains(file_path)
  }

  fn cwd(&self) -> PathBuf {
    PathBuf::from("/project")
  }

  fn global_settings_path(&self) -> Option<PathBuf> {
    Some(PathBuf::from("/config/chainfmt/settings.json"))
  }

  fn read_stdin(&self) -> Result<String> {
    match self.stdin.borrow_mut().take() {
      Some(text) => Ok(text),
      None => bail!("No stdin was provided."),
    }
  }

  fn log(&self, text: &str) {
    self.logged_messages.borrow_mut().push(text.to_string());
  }

  fn write_stdout(&self, text: &str) {
    self.logged_messages.borrow_mut().push(text.to_string());
  }

  fn log_stderr_with_context(&self, text: &str, _context_name: &str) {
    self.logged_errors.borrow_mut().push(text.to_string());
  }

  fn notify(&self, kind: NotificationKind, text: &str) {
    self.notifications.borrow_mut().push((kind, text.to_string()));
  }

  fn is_verbose(&self) -> bool {
    self.is_verbose.get()
  }

  fn set_verbose(&self, value: bool) {
    self.is_verbose.set(value);
  }

  async fn sleep(&self, duration: Duration) {
    self.sleeps.borrow_mut().push(duration);
    // still yield so other local tasks get a chance to run
    tokio::task::yield_now().await;
  }
}
