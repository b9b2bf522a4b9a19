use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use super::Settings;
use super::SettingsLayer;
use super::SettingsParseError;
use super::SettingsScope;
use crate::environment::Environment;
use crate::utils::Fingerprint;

pub const SETTINGS_DIR_NAME: &str = ".chainfmt";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
#[error("Error loading {scope} settings at {}. {error:#}", .file_path.display())]
pub struct SettingsLoadError {
  pub scope: SettingsScope,
  pub file_path: PathBuf,
  pub error: anyhow::Error,
}

/// Where each settings layer is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPaths {
  pub global: Option<PathBuf>,
  pub workspace: PathBuf,
  pub workspace_folder: Option<PathBuf>,
}

impl SettingsPaths {
  pub fn iter(&self) -> impl Iterator<Item = (SettingsScope, &PathBuf)> {
    self
      .global
      .iter()
      .map(|path| (SettingsScope::Global, path))
      .chain(std::iter::once((SettingsScope::Workspace, &self.workspace)))
      .chain(self.workspace_folder.iter().map(|path| (SettingsScope::WorkspaceFolder, path)))
  }
}

pub fn get_settings_file_path(dir_path: &Path) -> PathBuf {
  dir_path.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME)
}

/// Finds the settings files that apply to a document.
///
/// The workspace folder layer is the nearest settings file in a directory
/// between the document and the workspace root, excluding the root.
pub fn discover_settings_paths(environment: &impl Environment, workspace_root: &Path, document_path: Option<&Path>) -> SettingsPaths {
  let workspace_folder = document_path.and_then(|document_path| {
    if !document_path.starts_with(workspace_root) {
      return None;
    }
    for ancestor in document_path.ancestors().skip(1) {
      if ancestor == workspace_root {
        break;
      }
      let file_path = get_settings_file_path(ancestor);
      if environment.path_exists(&file_path) {
        return Some(file_path);
      }
    }
    None
  });
  SettingsPaths {
    global: environment.global_settings_path(),
    workspace: get_settings_file_path(workspace_root),
    workspace_folder,
  }
}

/// Loads the layers. Global and workspace layers always exist (empty when
/// their file is missing) so there is always a scope to write to.
pub fn load_settings_layers(
  environment: &impl Environment,
  paths: &SettingsPaths,
) -> Result<BTreeMap<SettingsScope, SettingsLayer>, SettingsLoadError> {
  let mut layers = BTreeMap::new();
  if paths.global.is_none() {
    layers.insert(SettingsScope::Global, SettingsLayer::default());
  }
  for (scope, file_path) in paths.iter() {
    let layer = if environment.path_exists(file_path) {
      log_debug!(environment, "Loading {} settings from {}", scope, file_path.display());
      let text = environment.read_file(file_path).map_err(|error| SettingsLoadError {
        scope,
        file_path: file_path.clone(),
        error,
      })?;
      let mut layer = SettingsLayer::parse(&text).map_err(|err: SettingsParseError| SettingsLoadError {
        scope,
        file_path: file_path.clone(),
        error: err.into(),
      })?;
      layer.file_path = Some(file_path.clone());
      layer.read_only = environment.is_read_only(file_path);
      layer
    } else {
      SettingsLayer::default()
    };
    layers.insert(scope, layer);
  }
  Ok(layers)
}

pub fn load_settings(environment: &impl Environment, paths: &SettingsPaths) -> Result<Settings, SettingsLoadError> {
  let settings = Settings::new();
  for (scope, layer) in load_settings_layers(environment, paths)? {
    settings.set_layer(scope, layer);
  }
  Ok(settings)
}

/// Fingerprint of the text of every settings file, used to notice edits.
pub fn get_settings_files_fingerprint(environment: &impl Environment, paths: &SettingsPaths) -> Fingerprint {
  let mut text = String::new();
  for (scope, file_path) in paths.iter() {
    text.push_str(scope.name());
    text.push('\0');
    if let Ok(file_text) = environment.read_file(file_path) {
      text.push_str(&file_text);
    }
    text.push('\0');
  }
  Fingerprint::of(&text)
}
