/// Breadth at which a setting is read or written.
///
/// Variants are ordered from broadest to narrowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingsScope {
  Global,
  Workspace,
  WorkspaceFolder,
}

impl SettingsScope {
  pub fn name(&self) -> &'static str {
    match self {
      SettingsScope::Global => "global",
      SettingsScope::Workspace => "workspace",
      SettingsScope::WorkspaceFolder => "workspace folder",
    }
  }
}

impl std::fmt::Display for SettingsScope {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}
