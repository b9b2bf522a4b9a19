use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

pub type SettingsMap = IndexMap<String, Value>;

#[derive(Debug, Error)]
pub enum SettingsParseError {
  #[error("Error parsing settings file. {0}")]
  Jsonc(jsonc_parser::errors::ParseError),
  #[error("Expected the settings file to contain an object.")]
  ExpectedObject,
  #[error("Expected the value of '{0}' to be an object.")]
  ExpectedLanguageObject(String),
  #[error("Invalid language override key '{0}'. Expected something like \"[typescript]\".")]
  InvalidLanguageKey(String),
}

/// Settings from a single file.
///
/// Keys are flat and dotted (ex. `chainfmt.formatters`). Keys in the
/// form `[language]` hold overrides that only apply to that language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsLayer {
  pub file_path: Option<PathBuf>,
  /// Set when the backing file can't be written to.
  pub read_only: bool,
  pub general: SettingsMap,
  pub languages: IndexMap<String, SettingsMap>,
}

impl SettingsLayer {
  pub fn parse(text: &str) -> Result<Self, SettingsParseError> {
    let value = jsonc_parser::parse_to_serde_value(text, &Default::default()).map_err(SettingsParseError::Jsonc)?;
    let object = match value {
      Some(Value::Object(object)) => object,
      // an empty file is the same as an empty object
      None => return Ok(Default::default()),
      Some(_) => return Err(SettingsParseError::ExpectedObject),
    };
    let mut layer = SettingsLayer::default();
    for (key, value) in object {
      if key.starts_with('[') {
        let language_ids = parse_language_override_key(&key).ok_or_else(|| SettingsParseError::InvalidLanguageKey(key.clone()))?;
        let Value::Object(values) = value else {
          return Err(SettingsParseError::ExpectedLanguageObject(key));
        };
        for language_id in language_ids {
          let block = layer.languages.entry(language_id).or_default();
          for (key, value) in values.iter() {
            block.insert(key.clone(), value.clone());
          }
        }
      } else {
        layer.general.insert(key, value);
      }
    }
    Ok(layer)
  }

  pub fn get(&self, key: &str, language_id: Option<&str>) -> Option<&Value> {
    match language_id {
      Some(language_id) => self.languages.get(language_id).and_then(|block| block.get(key)),
      None => self.general.get(key),
    }
  }

  /// Sets or removes a value. Language blocks that become empty are removed.
  pub fn set(&mut self, key: &str, language_id: Option<&str>, value: Option<Value>) {
    match language_id {
      Some(language_id) => match value {
        Some(value) => {
          self.languages.entry(language_id.to_string()).or_default().insert(key.to_string(), value);
        }
        None => {
          if let Some(block) = self.languages.get_mut(language_id) {
            block.shift_remove(key);
            if block.is_empty() {
              self.languages.shift_remove(language_id);
            }
          }
        }
      },
      None => match value {
        Some(value) => {
          self.general.insert(key.to_string(), value);
        }
        None => {
          self.general.shift_remove(key);
        }
      },
    }
  }

  /// Every key in this layer. Language keys are prefixed with `[language].`
  pub fn qualified_keys(&self) -> impl Iterator<Item = (String, &Value)> {
    let general = self.general.iter().map(|(key, value)| (key.clone(), value));
    let languages = self
      .languages
      .iter()
      .flat_map(|(language_id, block)| block.iter().map(move |(key, value)| (format!("[{}].{}", language_id, key), value)));
    general.chain(languages)
  }
}

/// Parses `[a]` or `[a][b]` into the language ids.
fn parse_language_override_key(key: &str) -> Option<Vec<String>> {
  let mut language_ids = Vec::new();
  let mut remaining = key.trim();
  while !remaining.is_empty() {
    let rest = remaining.strip_prefix('[')?;
    let end = rest.find(']')?;
    let language_id = rest[..end].trim();
    if language_id.is_empty() {
      return None;
    }
    language_ids.push(language_id.to_string());
    remaining = rest[end + 1..].trim_start();
  }
  if language_ids.is_empty() { None } else { Some(language_ids) }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  #[test]
  fn parses_general_and_language_blocks() {
    let layer = SettingsLayer::parse(
      r#"{
  // comments are allowed
  "chainfmt.formatters": ["a", "b"],
  "[typescript]": {
    "editor.defaultFormatter": "other.tool",
  },
  "[javascript][javascriptreact]": {
    "chainfmt.formatters": ["c"]
  }
}"#,
    )
    .unwrap();
    assert_eq!(layer.get("chainfmt.formatters", None), Some(&json!(["a", "b"])));
    assert_eq!(layer.get("editor.defaultFormatter", Some("typescript")), Some(&json!("other.tool")));
    assert_eq!(layer.get("chainfmt.formatters", Some("javascript")), Some(&json!(["c"])));
    assert_eq!(layer.get("chainfmt.formatters", Some("javascriptreact")), Some(&json!(["c"])));
    assert_eq!(layer.get("chainfmt.formatters", Some("typescript")), None);
    assert_eq!(
      layer.languages.keys().cloned().collect::<Vec<_>>(),
      vec!["typescript".to_string(), "javascript".to_string(), "javascriptreact".to_string()]
    );
  }

  #[test]
  fn empty_text_is_empty_layer() {
    assert_eq!(SettingsLayer::parse("").unwrap(), SettingsLayer::default());
    assert_eq!(SettingsLayer::parse("  // nothing\n").unwrap(), SettingsLayer::default());
  }

  #[test]
  fn errors_for_invalid_shapes() {
    assert!(matches!(SettingsLayer::parse("[]"), Err(SettingsParseError::ExpectedObject)));
    assert!(matches!(
      SettingsLayer::parse(r#"{ "[typescript]": 5 }"#),
      Err(SettingsParseError::ExpectedLanguageObject(_))
    ));
    assert!(matches!(SettingsLayer::parse(r#"{ "[]": {} }"#), Err(SettingsParseError::InvalidLanguageKey(_))));
    assert!(matches!(SettingsLayer::parse(r#"{ "a": "#), Err(SettingsParseError::Jsonc(_))));
  }

  #[test]
  fn set_and_remove_language_value() {
    let mut layer = SettingsLayer::default();
    layer.set("editor.defaultFormatter", Some("rust"), Some(json!("fmt")));
    assert_eq!(layer.get("editor.defaultFormatter", Some("rust")), Some(&json!("fmt")));
    layer.set("editor.defaultFormatter", Some("rust"), None);
    assert_eq!(layer.get("editor.defaultFormatter", Some("rust")), None);
    assert!(layer.languages.is_empty());
  }
}
