use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::ActivationConfirmer;
use super::ActivationPolicy;
use super::ActiveFormatterSlot;
use super::FormatterChain;
use super::PollingActivation;
use super::RecursionGuard;
use crate::environment::Environment;
use crate::host::EditorHost;
use crate::host::HostDocument;
use crate::utils::Fingerprint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
  /// Time given to the host after each settings write and each format invocation.
  pub delay: Duration,
  pub save_after_each: bool,
  pub save_after_chain: bool,
  pub activation: ActivationPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  /// Another run held the recursion guard.
  AlreadyRunning,
  /// The document had no unsaved modifications.
  NotDirty,
  EmptyChain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditResult {
  Skipped(SkipReason),
  NoChanges,
  /// Replace the entire document with this text.
  Replace(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
  pub formatter_id: String,
  pub confirmed: bool,
  pub changed: bool,
  pub error: Option<String>,
}

/// A failure that ended the run early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
  pub formatter_id: Option<String>,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
  pub edit: EditResult,
  pub steps: Vec<StepReport>,
  pub cancelled: bool,
  pub failure: Option<RunFailure>,
}

impl RunReport {
  fn skipped(reason: SkipReason) -> Self {
    Self {
      edit: EditResult::Skipped(reason),
      steps: Vec::new(),
      cancelled: false,
      failure: None,
    }
  }

  pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
    self.steps.iter().filter(|step| step.error.is_some())
  }
}

#[derive(Default)]
struct SteppingOutcome {
  steps: Vec<StepReport>,
  cancelled: bool,
  failure: Option<RunFailure>,
}

/// Runs a chain against a live document, one formatter at a time.
///
/// Each step makes its formatter the host's active formatter for the
/// document's language and then invokes the host's generic format action.
/// Steps never run in parallel because the active formatter setting can
/// only hold one value.
pub struct PipelineExecutor<'a, TEnvironment: Environment, THost: EditorHost> {
  environment: &'a TEnvironment,
  host: &'a THost,
  recursion_guard: &'a RecursionGuard,
  confirmer: Box<dyn ActivationConfirmer + 'a>,
}

impl<'a, TEnvironment: Environment, THost: EditorHost> PipelineExecutor<'a, TEnvironment, THost> {
  pub fn new(environment: &'a TEnvironment, host: &'a THost, recursion_guard: &'a RecursionGuard) -> Self {
    Self {
      environment,
      host,
      recursion_guard,
      confirmer: Box::new(PollingActivation::new(environment.clone())),
    }
  }

  pub fn with_confirmer(mut self, confirmer: impl ActivationConfirmer + 'a) -> Self {
    self.confirmer = Box::new(confirmer);
    self
  }

  pub async fn run(&self, document: &THost::Document, chain: &FormatterChain, options: &RunOptions, token: &CancellationToken) -> RunReport {
    let Some(_permit) = self.recursion_guard.try_acquire() else {
      log_debug!(self.environment, "Formatting already in progress. Skipping {}.", document.file_path().display());
      return RunReport::skipped(SkipReason::AlreadyRunning);
    };
    if !document.is_dirty() {
      log_debug!(self.environment, "No unsaved changes in {}. Skipping.", document.file_path().display());
      return RunReport::skipped(SkipReason::NotDirty);
    }
    if chain.is_empty() {
      log_debug!(self.environment, "No formatters for '{}'. Skipping.", document.language_id());
      return RunReport::skipped(SkipReason::EmptyChain);
    }

    let original_text = document.text();
    let mut slot = match ActiveFormatterSlot::acquire(self.host.settings(), document.language_id()) {
      Ok(slot) => slot,
      Err(err) => {
        log_error!(self.environment, "Could not capture the active formatter. {}", err);
        return RunReport {
          edit: EditResult::NoChanges,
          steps: Vec::new(),
          cancelled: false,
          failure: Some(RunFailure {
            formatter_id: None,
            message: err.to_string(),
          }),
        };
      }
    };
    log_debug!(
      self.environment,
      "Running {} for {} ({}). Active formatter at {} scope was {}.",
      chain,
      document.file_path().display(),
      document.language_id(),
      slot.scope(),
      display_value(slot.original()),
    );

    let outcome = self.run_steps(document, chain, options, token, &mut slot, &original_text).await;

    let original_value = display_value(slot.original());
    let scope = slot.scope();
    match slot.restore().await {
      Ok(()) => log_debug!(self.environment, "Restored active formatter at {} scope to {}.", scope, original_value),
      Err(err) => log_error!(self.environment, "Failed restoring the active formatter at {} scope. {}", scope, err),
    }

    let mut failure = outcome.failure;
    if !options.save_after_each && options.save_after_chain && failure.is_none() && document.is_dirty() {
      if let Err(err) = self.host.save_document(document).await {
        log_error!(self.environment, "Failed saving {}. {:#}", document.file_path().display(), err);
        failure = Some(RunFailure {
          formatter_id: None,
          message: format!("{:#}", err),
        });
      }
    }

    let final_text = document.text();
    let edit = if final_text == original_text {
      log_debug!(self.environment, "No changes to {}.", document.file_path().display());
      EditResult::NoChanges
    } else {
      EditResult::Replace(final_text)
    };
    RunReport {
      edit,
      steps: outcome.steps,
      cancelled: outcome.cancelled,
      failure,
    }
  }

  async fn run_steps(
    &self,
    document: &THost::Document,
    chain: &FormatterChain,
    options: &RunOptions,
    token: &CancellationToken,
    slot: &mut ActiveFormatterSlot,
    original_text: &str,
  ) -> SteppingOutcome {
    let mut outcome = SteppingOutcome::default();
    let mut previous_fingerprint = Fingerprint::of(original_text);
    let steps_len = chain.len();
    for (index, step) in chain.steps().iter().enumerate() {
      if token.is_cancelled() {
        log_debug!(self.environment, "Cancelled before step {}/{} ({}).", index + 1, steps_len, step);
        outcome.cancelled = true;
        break;
      }
      log_debug!(self.environment, "Step {}/{}: {}", index + 1, steps_len, step);

      if let Err(err) = slot.activate(step.id()).await {
        log_error!(self.environment, "Failed activating formatter '{}'. {}", step, err);
        outcome.failure = Some(RunFailure {
          formatter_id: Some(step.id().to_string()),
          message: err.to_string(),
        });
        break;
      }
      self.environment.sleep(options.delay).await;
      let confirmed = self.confirmer.confirm(slot, step.id(), &options.activation).await;
      if !confirmed {
        log_warn!(
          self.environment,
          "Could not confirm '{}' became the active formatter after {} attempts. Formatting anyway.",
          step,
          options.activation.attempts
        );
      }

      let format_result = self.host.format_document(document).await;
      self.environment.sleep(options.delay).await;

      let fingerprint = Fingerprint::of(&document.text());
      let changed = previous_fingerprint.changed(&fingerprint);
      log_debug!(
        self.environment,
        "Step {}/{}: {} finished. Fingerprint {} -> {} ({}).",
        index + 1,
        steps_len,
        step,
        previous_fingerprint,
        fingerprint,
        if changed { "changed" } else { "unchanged" },
      );
      previous_fingerprint = fingerprint;

      let error = match format_result {
        Ok(()) => None,
        Err(err) => {
          log_error!(self.environment, "Formatter '{}' failed. {:#}", step, err);
          Some(format!("{:#}", err))
        }
      };
      outcome.steps.push(StepReport {
        formatter_id: step.id().to_string(),
        confirmed,
        changed,
        error,
      });

      if options.save_after_each && document.is_dirty() {
        if let Err(err) = self.host.save_document(document).await {
          log_error!(self.environment, "Failed saving after '{}'. {:#}", step, err);
          outcome.failure = Some(RunFailure {
            formatter_id: Some(step.id().to_string()),
            message: format!("{:#}", err),
          });
          break;
        }
      }
    }
    outcome
  }
}

fn display_value(value: Option<&serde_json::Value>) -> String {
  match value {
    Some(value) => value.to_string(),
    None => "(unset)".to_string(),
  }
}
