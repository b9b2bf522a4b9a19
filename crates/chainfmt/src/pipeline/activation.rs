use std::time::Duration;

use async_trait::async_trait;

use super::ActiveFormatterSlot;
use crate::environment::Environment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationPolicy {
  pub attempts: u32,
  pub interval: Duration,
}

/// Waits for the host to report a formatter as the active one.
///
/// This is a best-effort wait. Returning `false` means the formatter
/// could not be confirmed, not that it is unavailable.
#[async_trait(?Send)]
pub trait ActivationConfirmer {
  async fn confirm(&self, slot: &ActiveFormatterSlot, formatter_id: &str, policy: &ActivationPolicy) -> bool;
}

/// Reads the setting back at a fixed interval until it matches.
pub struct PollingActivation<TEnvironment: Environment> {
  environment: TEnvironment,
}

impl<TEnvironment: Environment> PollingActivation<TEnvironment> {
  pub fn new(environment: TEnvironment) -> Self {
    Self { environment }
  }
}

#[async_trait(?Send)]
impl<TEnvironment: Environment> ActivationConfirmer for PollingActivation<TEnvironment> {
  async fn confirm(&self, slot: &ActiveFormatterSlot, formatter_id: &str, policy: &ActivationPolicy) -> bool {
    for attempt in 1..=policy.attempts {
      if slot.is_active(formatter_id) {
        if attempt > 1 {
          log_debug!(self.environment, "Confirmed '{}' as active after {} attempts.", formatter_id, attempt);
        }
        return true;
      }
      if attempt < policy.attempts {
        self.environment.sleep(policy.interval).await;
      }
    }
    false
  }
}
