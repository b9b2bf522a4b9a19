use std::time::Duration;

use serde::de::DeserializeOwned;

use super::ACTIVATION_POLL_ATTEMPTS_KEY;
use super::ACTIVATION_POLL_INTERVAL_KEY;
use super::DEFAULT_FORMATTER_KEY;
use super::FORMATTER_DELAY_KEY;
use super::FORMATTERS_KEY;
use super::LANGUAGES_KEY;
use super::SAVE_AFTER_CHAIN_KEY;
use super::SAVE_AFTER_EACH_FORMATTER_KEY;
use super::Settings;
use super::get_language_family;
use crate::environment::Environment;
use crate::pipeline::ActivationPolicy;
use crate::pipeline::FormatterChain;
use crate::pipeline::RunOptions;
use crate::pipeline::is_reserved_id;

pub const DEFAULT_FORMATTER_DELAY_MS: u64 = 100;
pub const MIN_FORMATTER_DELAY_MS: u64 = 10;
pub const MAX_FORMATTER_DELAY_MS: u64 = 5_000;
const DEFAULT_ACTIVATION_POLL_ATTEMPTS: u32 = 10;
const MAX_ACTIVATION_POLL_ATTEMPTS: u32 = 100;
const DEFAULT_ACTIVATION_POLL_INTERVAL_MS: u64 = 20;
const MAX_ACTIVATION_POLL_INTERVAL_MS: u64 = 1_000;

/// Gets the chain of formatters to run for a language.
///
/// The host's default formatter for the language runs first when it is
/// something other than this orchestrator. It is followed by the first
/// non-empty formatters list found in the language's block, the language
/// family's block and then the global list.
pub fn resolve_chain(settings: &Settings, language_id: &str, environment: &impl Environment) -> FormatterChain {
  if !is_language_enabled(settings, language_id, environment) {
    log_debug!(environment, "Language '{}' is not in {}. Skipping.", language_id, LANGUAGES_KEY);
    return FormatterChain::default();
  }

  let mut ids = Vec::new();
  if let Some(default_formatter) = read_or_warn::<String>(settings, DEFAULT_FORMATTER_KEY, Some(language_id), environment)
    && !is_reserved_id(&default_formatter)
  {
    ids.push(default_formatter);
  }

  let formatters = language_block_formatters(settings, language_id, environment)
    .or_else(|| {
      let family = get_language_family(settings, language_id, environment)?;
      log_debug!(environment, "Looking up formatters for '{}' using family '{}'.", language_id, family);
      language_block_formatters(settings, &family, environment)
    })
    .or_else(|| {
      let inspection = settings.inspect(FORMATTERS_KEY, None);
      let value = inspection.general_value()?.clone();
      parse_or_warn::<Vec<String>>(FORMATTERS_KEY, value, environment)
    })
    .unwrap_or_default();
  ids.extend(formatters);

  let chain = FormatterChain::from_ids(ids);
  log_debug!(environment, "Resolved chain for '{}': {}", language_id, chain);
  chain
}

pub fn is_language_enabled(settings: &Settings, language_id: &str, environment: &impl Environment) -> bool {
  let languages = read_or_warn::<Vec<String>>(settings, LANGUAGES_KEY, None, environment).unwrap_or_default();
  languages.is_empty() || languages.iter().any(|id| id == language_id)
}

/// Gets the formatters list from a language block only when non-empty.
fn language_block_formatters(settings: &Settings, language_id: &str, environment: &impl Environment) -> Option<Vec<String>> {
  let inspection = settings.inspect(FORMATTERS_KEY, Some(language_id));
  let value = inspection.language_value()?.clone();
  let formatters = parse_or_warn::<Vec<String>>(FORMATTERS_KEY, value, environment)?;
  let formatters = formatters.into_iter().filter(|id| !is_reserved_id(id)).collect::<Vec<_>>();
  if formatters.is_empty() { None } else { Some(formatters) }
}

pub fn resolve_run_options(settings: &Settings, language_id: &str, environment: &impl Environment) -> RunOptions {
  let language_id = Some(language_id);
  let delay_ms = read_or_warn::<u64>(settings, FORMATTER_DELAY_KEY, language_id, environment)
    .unwrap_or(DEFAULT_FORMATTER_DELAY_MS)
    .clamp(MIN_FORMATTER_DELAY_MS, MAX_FORMATTER_DELAY_MS);
  let attempts = read_or_warn::<u32>(settings, ACTIVATION_POLL_ATTEMPTS_KEY, language_id, environment)
    .unwrap_or(DEFAULT_ACTIVATION_POLL_ATTEMPTS)
    .clamp(1, MAX_ACTIVATION_POLL_ATTEMPTS);
  let interval_ms = read_or_warn::<u64>(settings, ACTIVATION_POLL_INTERVAL_KEY, language_id, environment)
    .unwrap_or(DEFAULT_ACTIVATION_POLL_INTERVAL_MS)
    .min(MAX_ACTIVATION_POLL_INTERVAL_MS);
  RunOptions {
    delay: Duration::from_millis(delay_ms),
    save_after_each: read_or_warn(settings, SAVE_AFTER_EACH_FORMATTER_KEY, language_id, environment).unwrap_or(false),
    save_after_chain: read_or_warn(settings, SAVE_AFTER_CHAIN_KEY, language_id, environment).unwrap_or(true),
    activation: ActivationPolicy {
      attempts,
      interval: Duration::from_millis(interval_ms),
    },
  }
}

/// Reads a setting, logging a warning and treating it as absent when it has the wrong shape.
pub fn read_or_warn<T: DeserializeOwned>(settings: &Settings, key: &str, language_id: Option<&str>, environment: &impl Environment) -> Option<T> {
  match settings.get::<T>(key, language_id) {
    Ok(value) => value,
    Err(err) => {
      log_warn!(environment, "{:#}", err);
      None
    }
  }
}

fn parse_or_warn<T: DeserializeOwned>(key: &str, value: serde_json::Value, environment: &impl Environment) -> Option<T> {
  match serde_json::from_value(value) {
    Ok(value) => Some(value),
    Err(err) => {
      log_warn!(environment, "Invalid value for setting '{}'.: {}", key, err);
      None
    }
  }
}
