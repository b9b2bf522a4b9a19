use std::path::Path;
use std::path::PathBuf;

use anyhow::Result;

use crate::arg_parser::CliArgs;
use crate::configuration::DEBUG_KEY;
use crate::configuration::Settings;
use crate::configuration::SettingsPaths;
use crate::configuration::discover_settings_paths;
use crate::configuration::load_settings;
use crate::configuration::read_or_warn;
use crate::environment::Environment;

/// The workspace the command runs in.
pub struct Workspace {
  pub root: PathBuf,
}

impl Workspace {
  pub fn from_args(args: &CliArgs, environment: &impl Environment) -> Self {
    let root = match &args.workspace {
      Some(dir) => resolve_path(environment, dir),
      None => environment.cwd(),
    };
    Self { root }
  }

  /// Loads the settings that apply to the document, or to the whole
  /// workspace when no document is provided.
  pub fn load_settings(&self, environment: &impl Environment, document_path: Option<&Path>) -> Result<(Settings, SettingsPaths)> {
    let paths = discover_settings_paths(environment, &self.root, document_path);
    let settings = load_settings(environment, &paths)?;
    log_debug!(
      environment,
      "Loaded settings scopes: {}",
      settings.available_scopes().iter().map(|scope| scope.name()).collect::<Vec<_>>().join(", ")
    );
    if read_or_warn::<bool>(&settings, DEBUG_KEY, None, environment) == Some(true) && !environment.is_verbose() {
      environment.set_verbose(true);
      log_debug!(environment, "Debug output enabled by {}.", DEBUG_KEY);
    }
    Ok((settings, paths))
  }
}

/// Resolves a path provided on the command line against the cwd.
pub fn resolve_path(environment: &impl Environment, path: &str) -> PathBuf {
  let path = PathBuf::from(path);
  if path.is_absolute() { path } else { environment.cwd().join(path) }
}
