//! Explanation of an identifier that matched more than one entity.

use std::fmt;

use super::error::EntityKind;
use super::Candidate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMatch {
  pub id: String,
  pub name: String,
  /// Owner, state, backing issue: whatever tells same-named entities apart
  pub context: Option<String>,
}

/// Every candidate an identifier matched, in candidate-list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
  pub kind: EntityKind,
  pub identifier: String,
  pub matches: Vec<AmbiguousMatch>,
}

impl Ambiguity {
  pub fn new<T: Candidate>(identifier: &str, matches: &[&T]) -> Self {
    Self {
      kind: T::KIND,
      identifier: identifier.to_string(),
      matches: matches
        .iter()
        .map(|c| AmbiguousMatch {
          id: c.id().to_string(),
          name: c.display_name().into_owned(),
          context: c.context(),
        })
        .collect(),
    }
  }

  #[cfg(test)]
  pub fn names(&self) -> Vec<&str> {
    self.matches.iter().map(|m| m.name.as_str()).collect()
  }
}

impl fmt::Display for Ambiguity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "'{}' is ambiguous, it matches {} {}:",
      self.identifier,
      self.matches.len(),
      self.kind.plural()
    )?;
    let width = self.matches.iter().map(|m| m.id.len()).max().unwrap_or(0);
    for m in &self.matches {
      write!(f, "\n  {:<width$}  {}", m.id, m.name, width = width)?;
      if let Some(context) = &m.context {
        write!(f, " ({})", context)?;
      }
    }
    write!(f, "\nUse more of the name, or the id.")
  }
}
