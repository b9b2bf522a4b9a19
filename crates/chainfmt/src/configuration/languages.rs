use std::path::Path;

use indexmap::IndexMap;

use super::FILE_ASSOCIATIONS_KEY;
use super::LANGUAGE_FAMILIES_KEY;
use super::Settings;
use crate::environment::Environment;

const BUILT_IN_FAMILIES: [(&str, &str); 2] = [("javascriptreact", "javascript"), ("typescriptreact", "typescript")];

const BUILT_IN_EXTENSIONS: [(&str, &str); 24] = [
  ("js", "javascript"),
  ("mjs", "javascript"),
  ("cjs", "javascript"),
  ("jsx", "javascriptreact"),
  ("ts", "typescript"),
  ("mts", "typescript"),
  ("cts", "typescript"),
  ("tsx", "typescriptreact"),
  ("json", "json"),
  ("jsonc", "jsonc"),
  ("md", "markdown"),
  ("css", "css"),
  ("scss", "scss"),
  ("less", "less"),
  ("html", "html"),
  ("vue", "vue"),
  ("yaml", "yaml"),
  ("yml", "yaml"),
  ("toml", "toml"),
  ("rs", "rust"),
  ("py", "python"),
  ("go", "go"),
  ("sh", "shellscript"),
  ("sql", "sql"),
];

/// Gets the base language a language falls back to for formatter lookup.
///
/// Configured families take precedence over the built-in ones.
pub fn get_language_family(settings: &Settings, language_id: &str, environment: &impl Environment) -> Option<String> {
  let configured = match settings.get::<IndexMap<String, String>>(LANGUAGE_FAMILIES_KEY, None) {
    Ok(value) => value.unwrap_or_default(),
    Err(err) => {
      log_warn!(environment, "{:#}", err);
      Default::default()
    }
  };
  let family = configured
    .get(language_id)
    .cloned()
    .or_else(|| BUILT_IN_FAMILIES.iter().find(|(id, _)| *id == language_id).map(|(_, family)| family.to_string()))?;
  if family == language_id || family.is_empty() { None } else { Some(family) }
}

/// Gets the language id of a file from its extension.
pub fn detect_language_id(settings: &Settings, file_path: &Path, environment: &impl Environment) -> Option<String> {
  let extension = file_path.extension()?.to_string_lossy().to_lowercase();
  let associations = match settings.get::<IndexMap<String, String>>(FILE_ASSOCIATIONS_KEY, None) {
    Ok(value) => value.unwrap_or_default(),
    Err(err) => {
      log_warn!(environment, "{:#}", err);
      Default::default()
    }
  };
  for (key, language_id) in associations.iter() {
    if key.trim_start_matches('.').eq_ignore_ascii_case(&extension) {
      return Some(language_id.clone());
    }
  }
  BUILT_IN_EXTENSIONS
    .iter()
    .find(|(ext, _)| *ext == extension)
    .map(|(_, language_id)| language_id.to_string())
}
