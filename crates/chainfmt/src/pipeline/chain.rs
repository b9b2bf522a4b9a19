use crate::configuration::ORCHESTRATOR_ID;

/// One stage of a chain. Identifies a formatter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatterStep(String);

impl FormatterStep {
  pub fn id(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for FormatterStep {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Ordered formatters to run for one document.
///
/// The order is kept exactly as provided. The orchestrator's own id and
/// blank ids are dropped on construction so a chain can never invoke itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatterChain {
  steps: Vec<FormatterStep>,
}

impl FormatterChain {
  pub fn from_ids<T: Into<String>>(ids: impl IntoIterator<Item = T>) -> Self {
    Self {
      steps: ids
        .into_iter()
        .map(Into::into)
        .filter(|id| !is_reserved_id(id))
        .map(FormatterStep)
        .collect(),
    }
  }

  pub fn steps(&self) -> &[FormatterStep] {
    &self.steps
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn ids(&self) -> impl Iterator<Item = &str> {
    self.steps.iter().map(|step| step.id())
  }
}

impl std::fmt::Display for FormatterChain {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.steps.is_empty() {
      return f.write_str("(empty)");
    }
    f.write_str(&self.ids().collect::<Vec<_>>().join(" -> "))
  }
}

pub fn is_reserved_id(id: &str) -> bool {
  let id = id.trim();
  id.is_empty() || id.eq_ignore_ascii_case(ORCHESTRATOR_ID)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn keeps_order_and_drops_self() {
    let chain = FormatterChain::from_ids(["b", "chainfmt", "a", "", "b"]);
    assert_eq!(chain.ids().collect::<Vec<_>>(), vec!["b", "a", "b"]);
    assert_eq!(chain.to_string(), "b -> a -> b");
    assert_eq!(FormatterChain::default().to_string(), "(empty)");
  }
}
