use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Context;
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::SettingsLayer;
use super::SettingsScope;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsWriteError {
  #[error("No settings scopes are available.")]
  NoScopes,
  #[error("No {0} settings are available to write to.")]
  ScopeUnavailable(SettingsScope),
  #[error("The {0} settings are read-only.")]
  ReadOnly(SettingsScope),
}

/// The values of one key across every available scope.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingInspection {
  /// Ordered broadest to narrowest.
  pub scopes: Vec<ScopedValues>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopedValues {
  pub scope: SettingsScope,
  pub general: Option<Value>,
  pub language: Option<Value>,
}

impl SettingInspection {
  /// The narrowest value set inside a language block.
  pub fn language_value(&self) -> Option<&Value> {
    self.scopes.iter().rev().find_map(|values| values.language.as_ref())
  }

  /// The narrowest value set outside of any language block.
  pub fn general_value(&self) -> Option<&Value> {
    self.scopes.iter().rev().find_map(|values| values.general.as_ref())
  }

  /// A language block value at any scope beats a general value at
  /// any scope. Within each kind, the narrower scope wins.
  pub fn effective_value(&self) -> Option<&Value> {
    self.language_value().or_else(|| self.general_value())
  }
}

/// Layered settings shared between the resolver, the host and the executor.
///
/// Cloning creates another handle to the same settings.
#[derive(Clone, Default)]
pub struct Settings(Rc<RefCell<SettingsState>>);

#[derive(Default)]
struct SettingsState {
  layers: BTreeMap<SettingsScope, SettingsLayer>,
  version: u64,
}

impl Settings {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn with_layer(self, scope: SettingsScope, layer: SettingsLayer) -> Self {
    self.set_layer(scope, layer);
    self
  }

  pub fn set_layer(&self, scope: SettingsScope, layer: SettingsLayer) {
    let mut state = self.0.borrow_mut();
    state.layers.insert(scope, layer);
    state.version += 1;
  }

  /// Incremented on every change.
  pub fn version(&self) -> u64 {
    self.0.borrow().version
  }

  pub fn layer(&self, scope: SettingsScope) -> Option<SettingsLayer> {
    self.0.borrow().layers.get(&scope).cloned()
  }

  pub fn available_scopes(&self) -> Vec<SettingsScope> {
    self.0.borrow().layers.keys().copied().collect()
  }

  pub fn narrowest_scope(&self) -> Option<SettingsScope> {
    self.0.borrow().layers.keys().next_back().copied()
  }

  pub fn inspect(&self, key: &str, language_id: Option<&str>) -> SettingInspection {
    let state = self.0.borrow();
    SettingInspection {
      scopes: state
        .layers
        .iter()
        .map(|(scope, layer)| ScopedValues {
          scope: *scope,
          general: layer.get(key, None).cloned(),
          language: language_id.and_then(|language_id| layer.get(key, Some(language_id)).cloned()),
        })
        .collect(),
    }
  }

  pub fn get_value(&self, key: &str, language_id: Option<&str>) -> Option<Value> {
    self.inspect(key, language_id).effective_value().cloned()
  }

  /// Gets the effective value deserialized. Errors when the value has the wrong shape.
  pub fn get<T: DeserializeOwned>(&self, key: &str, language_id: Option<&str>) -> Result<Option<T>> {
    match self.get_value(key, language_id) {
      Some(value) => deserialize_value(key, value).map(Some),
      None => Ok(None),
    }
  }

  /// The value stored at exactly this scope, without any inheritance.
  pub fn get_raw(&self, scope: SettingsScope, key: &str, language_id: Option<&str>) -> Option<Value> {
    self.0.borrow().layers.get(&scope).and_then(|layer| layer.get(key, language_id).cloned())
  }

  /// Writes a value at exactly this scope. `None` removes the key.
  pub fn set_raw(&self, scope: SettingsScope, key: &str, language_id: Option<&str>, value: Option<Value>) -> Result<(), SettingsWriteError> {
    let mut state = self.0.borrow_mut();
    let layer = state.layers.get_mut(&scope).ok_or(SettingsWriteError::ScopeUnavailable(scope))?;
    if layer.read_only {
      return Err(SettingsWriteError::ReadOnly(scope));
    }
    layer.set(key, language_id, value);
    state.version += 1;
    Ok(())
  }

  /// Same as `set_raw`, but suspends first like a write to a host would.
  pub async fn update(&self, scope: SettingsScope, key: &str, language_id: Option<&str>, value: Option<Value>) -> Result<(), SettingsWriteError> {
    tokio::task::yield_now().await;
    self.set_raw(scope, key, language_id, value)
  }

  /// Language ids that have an override block in any layer, in first-seen order.
  pub fn language_ids(&self) -> Vec<String> {
    let state = self.0.borrow();
    let mut language_ids: Vec<String> = Vec::new();
    for layer in state.layers.values() {
      for language_id in layer.languages.keys() {
        if !language_ids.contains(language_id) {
          language_ids.push(language_id.clone());
        }
      }
    }
    language_ids
  }

  /// Replaces every layer and returns the qualified keys whose values changed.
  pub fn replace_layers(&self, layers: BTreeMap<SettingsScope, SettingsLayer>) -> Vec<String> {
    let mut state = self.0.borrow_mut();
    let mut changed_keys = Vec::new();
    let scopes = state.layers.keys().chain(layers.keys()).copied().collect::<std::collections::BTreeSet<_>>();
    for scope in scopes {
      let empty = SettingsLayer::default();
      let old = state.layers.get(&scope).unwrap_or(&empty);
      let new = layers.get(&scope).unwrap_or(&empty);
      for (key, value) in old.qualified_keys() {
        if new.qualified_keys().find(|(new_key, _)| *new_key == key).map(|(_, new_value)| new_value) != Some(value) && !changed_keys.contains(&key) {
          changed_keys.push(key);
        }
      }
      for (key, _) in new.qualified_keys() {
        if !old.qualified_keys().any(|(old_key, _)| old_key == key) && !changed_keys.contains(&key) {
          changed_keys.push(key);
        }
      }
    }
    state.layers = layers;
    state.version += 1;
    changed_keys
  }
}

fn deserialize_value<T: DeserializeOwned>(key: &str, value: Value) -> Result<T> {
  serde_json::from_value(value).with_context(|| format!("Invalid value for setting '{}'.", key))
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  fn layer(text: &str) -> SettingsLayer {
    SettingsLayer::parse(text).unwrap()
  }

  #[test]
  fn narrower_scope_wins() {
    let settings = Settings::new()
      .with_layer(SettingsScope::Global, layer(r#"{ "editor.formatOnSave": true }"#))
      .with_layer(SettingsScope::Workspace, layer(r#"{ "editor.formatOnSave": false }"#));
    assert_eq!(settings.get::<bool>("editor.formatOnSave", None).unwrap(), Some(false));
    assert_eq!(settings.get::<bool>("editor.formatOnSave", Some("rust")).unwrap(), Some(false));
  }

  #[test]
  fn language_block_beats_general_value() {
    let settings = Settings::new()
      .with_layer(SettingsScope::Global, layer(r#"{ "[rust]": { "editor.formatOnSave": false } }"#))
      .with_layer(SettingsScope::Workspace, layer(r#"{ "editor.formatOnSave": true }"#));
    assert_eq!(settings.get::<bool>("editor.formatOnSave", Some("rust")).unwrap(), Some(false));
    assert_eq!(settings.get::<bool>("editor.formatOnSave", Some("python")).unwrap(), Some(true));
  }

  #[test]
  fn wrong_type_errors() {
    let settings = Settings::new().with_layer(SettingsScope::Global, layer(r#"{ "editor.formatOnSave": "yes" }"#));
    let err = settings.get::<bool>("editor.formatOnSave", None).err().unwrap();
    assert_eq!(err.to_string(), "Invalid value for setting 'editor.formatOnSave'.");
  }

  #[test]
  fn writes_only_to_available_writable_scopes() {
    let mut global = layer("{}");
    global.read_only = true;
    let settings = Settings::new().with_layer(SettingsScope::Global, global).with_layer(SettingsScope::Workspace, layer("{}"));
    assert_eq!(settings.narrowest_scope(), Some(SettingsScope::Workspace));
    assert_eq!(
      settings.set_raw(SettingsScope::Global, "a", None, Some(json!(1))),
      Err(SettingsWriteError::ReadOnly(SettingsScope::Global))
    );
    assert_eq!(
      settings.set_raw(SettingsScope::WorkspaceFolder, "a", None, Some(json!(1))),
      Err(SettingsWriteError::ScopeUnavailable(SettingsScope::WorkspaceFolder))
    );
    let version = settings.version();
    settings.set_raw(SettingsScope::Workspace, "a", Some("rust"), Some(json!(1))).unwrap();
    assert_eq!(settings.get_raw(SettingsScope::Workspace, "a", Some("rust")), Some(json!(1)));
    assert_eq!(settings.get_raw(SettingsScope::Workspace, "a", None), None);
    assert!(settings.version() > version);
  }

  #[test]
  fn replace_layers_reports_changed_keys() {
    let settings = Settings::new().with_layer(
      SettingsScope::Global,
      layer(r#"{ "a": 1, "b": 2, "[rust]": { "editor.formatOnSave": true } }"#),
    );
    let mut layers = BTreeMap::new();
    layers.insert(SettingsScope::Global, layer(r#"{ "a": 1, "c": 3, "[rust]": { "editor.formatOnSave": false } }"#));
    let changed = settings.replace_layers(layers);
    assert_eq!(changed, vec!["b".to_string(), "[rust].editor.formatOnSave".to_string(), "c".to_string()]);
  }

  #[test]
  fn collects_language_ids() {
    let settings = Settings::new()
      .with_layer(SettingsScope::Global, layer(r#"{ "[rust]": {}, "[python]": {} }"#))
      .with_layer(SettingsScope::Workspace, layer(r#"{ "[python]": {}, "[go]": {} }"#));
    assert_eq!(settings.language_ids(), vec!["rust".to_string(), "python".to_string(), "go".to_string()]);
  }
}
