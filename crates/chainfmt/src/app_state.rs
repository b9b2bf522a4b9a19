use std::cell::RefCell;

use crate::conflicts::ConflictDetector;
use crate::conflicts::ConflictScanReport;
use crate::configuration::Settings;
use crate::environment::Environment;
use crate::pipeline::RecursionGuard;

/// Process-wide state created at startup and shut down on exit.
///
/// The executor is the only writer of the recursion flag and the conflict
/// detector is the only writer of the conflict record.
pub struct AppState<TEnvironment: Environment> {
  environment: TEnvironment,
  recursion_guard: RecursionGuard,
  conflict_detector: RefCell<ConflictDetector<TEnvironment>>,
}

impl<TEnvironment: Environment> AppState<TEnvironment> {
  pub fn startup(environment: TEnvironment) -> Self {
    log_debug!(environment, "Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    Self {
      recursion_guard: RecursionGuard::new(),
      conflict_detector: RefCell::new(ConflictDetector::new(environment.clone())),
      environment,
    }
  }

  pub fn recursion_guard(&self) -> &RecursionGuard {
    &self.recursion_guard
  }

  pub fn scan_conflicts(&self, settings: &Settings) -> ConflictScanReport {
    self.conflict_detector.borrow_mut().scan(settings)
  }

  pub fn on_configuration_changed(&self, settings: &Settings, changed_keys: &[String]) -> Option<ConflictScanReport> {
    log_debug!(self.environment, "Configuration changed: {}", changed_keys.join(", "));
    self
      .conflict_detector
      .borrow_mut()
      .on_configuration_changed(settings, changed_keys, &self.recursion_guard)
  }

  pub fn conflicted_languages(&self) -> Vec<String> {
    self.conflict_detector.borrow().conflicted_languages().map(|id| id.to_string()).collect()
  }

  pub fn shutdown(self) {
    if self.recursion_guard.is_held() {
      log_warn!(self.environment, "Shutting down while formatting is in progress.");
    }
    self.conflict_detector.borrow_mut().clear();
    log_debug!(self.environment, "Shut down.");
  }
}
