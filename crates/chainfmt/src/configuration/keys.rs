/// Identifier of this orchestrator. It must never appear in a chain.
pub const ORCHESTRATOR_ID: &str = "chainfmt";

pub const LANGUAGES_KEY: &str = "chainfmt.languages";
pub const FORMATTERS_KEY: &str = "chainfmt.formatters";
pub const FORMATTER_DELAY_KEY: &str = "chainfmt.formatterDelay";
pub const SAVE_AFTER_EACH_FORMATTER_KEY: &str = "chainfmt.saveAfterEachFormatter";
pub const SAVE_AFTER_CHAIN_KEY: &str = "chainfmt.saveAfterChain";
pub const SHOW_CONFLICT_WARNINGS_KEY: &str = "chainfmt.showFormattingConflictWarnings";
pub const ACTIVATION_POLL_ATTEMPTS_KEY: &str = "chainfmt.activationPollAttempts";
pub const ACTIVATION_POLL_INTERVAL_KEY: &str = "chainfmt.activationPollInterval";
pub const LANGUAGE_FAMILIES_KEY: &str = "chainfmt.languageFamilies";
pub const FILE_ASSOCIATIONS_KEY: &str = "chainfmt.fileAssociations";
pub const FORMATTER_COMMANDS_KEY: &str = "chainfmt.formatterCommands";
pub const DEBUG_KEY: &str = "chainfmt.debug";

// owned by the host, only read here (except the temporary override of the default formatter)
pub const DEFAULT_FORMATTER_KEY: &str = "editor.defaultFormatter";
pub const FORMAT_ON_SAVE_KEY: &str = "editor.formatOnSave";
