use crate::configuration::FORMATTERS_KEY;
use crate::configuration::LANGUAGES_KEY;
use crate::configuration::ORCHESTRATOR_ID;
use crate::configuration::Settings;
use crate::configuration::read_or_warn;
use crate::environment::Environment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
  FormatDocument,
  /// Formats the whole document. Range formatting is not supported.
  FormatSelection,
  /// Formats the document as the provided language.
  FormatDocumentAs(String),
  ToggleDebugMode,
}

impl EditorCommand {
  pub fn id(&self) -> String {
    match self {
      EditorCommand::FormatDocument => format!("{}.formatDocument", ORCHESTRATOR_ID),
      EditorCommand::FormatSelection => format!("{}.formatSelection", ORCHESTRATOR_ID),
      EditorCommand::FormatDocumentAs(language_id) => format!("{}.formatDocument.{}", ORCHESTRATOR_ID, language_id),
      EditorCommand::ToggleDebugMode => format!("{}.toggleDebugMode", ORCHESTRATOR_ID),
    }
  }

  pub fn description(&self) -> String {
    match self {
      EditorCommand::FormatDocument => "Format the document with its language's formatter chain.".to_string(),
      EditorCommand::FormatSelection => "Format the selection (formats the whole document).".to_string(),
      EditorCommand::FormatDocumentAs(language_id) => format!("Format the document with the {} formatter chain.", language_id),
      EditorCommand::ToggleDebugMode => "Toggle debug output.".to_string(),
    }
  }
}

/// The commands available for the current settings.
///
/// There is a derived per-language command for every language in the
/// allow-list or with its own formatters list.
pub struct CommandRegistry {
  commands: Vec<EditorCommand>,
}

impl CommandRegistry {
  pub fn from_settings(settings: &Settings, environment: &impl Environment) -> Self {
    let mut commands = vec![EditorCommand::FormatDocument, EditorCommand::FormatSelection];
    let mut language_ids = read_or_warn::<Vec<String>>(settings, LANGUAGES_KEY, None, environment).unwrap_or_default();
    for language_id in settings.language_ids() {
      if settings.inspect(FORMATTERS_KEY, Some(&language_id)).language_value().is_some() && !language_ids.contains(&language_id) {
        language_ids.push(language_id);
      }
    }
    for language_id in language_ids {
      let language_id = language_id.trim();
      if language_id.is_empty() {
        continue;
      }
      let command = EditorCommand::FormatDocumentAs(language_id.to_string());
      if !commands.contains(&command) {
        commands.push(command);
      }
    }
    commands.push(EditorCommand::ToggleDebugMode);
    Self { commands }
  }

  pub fn commands(&self) -> &[EditorCommand] {
    &self.commands
  }

  pub fn find(&self, command_id: &str) -> Option<&EditorCommand> {
    self.commands.iter().find(|command| command.id() == command_id)
  }
}
