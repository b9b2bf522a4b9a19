use std::hash::Hasher;

/// Digest of a document's full text.
///
/// This is a change oracle only. It is compared between the steps of a single
/// run to tell whether a formatter did anything and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
  pub fn of(text: &str) -> Self {
    let mut hasher = FastInsecureHasher::default();
    hasher.write(text.as_bytes());
    Fingerprint(hasher.finish())
  }

  pub fn changed(&self, after: &Fingerprint) -> bool {
    self != after
  }
}

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:016x}", self.0)
  }
}

/// A very fast insecure hasher that uses the xxHash algorithm.
#[derive(Default)]
pub struct FastInsecureHasher(twox_hash::XxHash64);

impl Hasher for FastInsecureHasher {
  fn finish(&self) -> u64 {
    self.0.finish()
  }

  fn write(&mut self, bytes: &[u8]) {
    self.0.write(bytes)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn equal_text_equal_fingerprint() {
    assert_eq!(Fingerprint::of("const a = 1;\n"), Fingerprint::of("const a = 1;\n"));
    assert!(!Fingerprint::of("x").changed(&Fingerprint::of("x")));
  }

  #[test]
  fn empty_text_is_stable() {
    let first = Fingerprint::of("");
    let second = Fingerprint::of(&String::new());
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
    assert_ne!(first, Fingerprint::of(" "));
  }

  #[test]
  fn single_character_change_is_detected() {
    let base = "function test() {\n  return 1;\n}\n";
    let base_fingerprint = Fingerprint::of(base);
    for (index, _) in base.char_indices() {
      let mut changed = base.to_string();
      changed.replace_range(index..index + 1, "#");
      if changed != base {
        assert!(base_fingerprint.changed(&Fingerprint::of(&changed)), "index {}", index);
      }
    }
  }

  #[test]
  fn order_sensitive() {
    assert_ne!(Fingerprint::of("ab"), Fingerprint::of("ba"));
    assert_ne!(Fingerprint::of("a\nb\n"), Fingerprint::of("b\na\n"));
  }
}
