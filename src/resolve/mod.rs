//! Entity resolution: turning a short human-typed string into exactly one
//! entity of a workspace.
//!
//! Every list-backed kind applies the same rules, first non-empty wins:
//! 1. exact id
//! 2. alias, whose target is then matched by exact name
//! 3. exact name, case-insensitive
//! 4. unique case-insensitive substring
//!
//! No match against a cached list triggers one refresh from the network
//! before giving up. Two or more matches are reported, never guessed.

pub mod ambiguity;
mod epic;
mod error;
mod issue;
mod pipeline;
mod simple;
mod sprint;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::debug;

use crate::cache::{CacheKey, CacheLayer, Cacheable};
use crate::zenhub::{ClientError, GraphqlExecutor};

pub use ambiguity::Ambiguity;
pub use error::{EntityKind, ResolveError};

/// User-defined shorthands, `alias -> display name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable(BTreeMap<String, String>);

impl AliasTable {
  /// Display name an alias stands for.
  pub fn target(&self, alias: &str) -> Option<&str> {
    self.0.get(alias).map(String::as_str)
  }
}

impl<A: Into<String>, N: Into<String>> FromIterator<(A, N)> for AliasTable {
  fn from_iter<I: IntoIterator<Item = (A, N)>>(iter: I) -> Self {
    Self(
      iter
        .into_iter()
        .map(|(a, n)| (a.into(), n.into()))
        .collect(),
    )
  }
}

/// A record an identifier can be matched against.
pub trait Candidate {
  const KIND: EntityKind;

  fn id(&self) -> &str;

  fn display_name(&self) -> Cow<'_, str>;

  /// Names tried by the exact-name and substring rules.
  fn names(&self) -> Vec<Cow<'_, str>> {
    vec![self.display_name()]
  }

  /// Whether the identifier is another stable reference to this record,
  /// such as the issue backing an epic. Several records may match.
  fn matches_reference(&self, _identifier: &str) -> bool {
    false
  }

  /// Text that tells apart candidates sharing a name.
  fn context(&self) -> Option<String> {
    None
  }
}

/// Which of the optional rules apply to a kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rules<'t> {
  pub by_id: bool,
  pub aliases: Option<&'t AliasTable>,
}

impl Rules<'static> {
  /// Exact name and substring only.
  pub const NAMES: Self = Rules {
    by_id: false,
    aliases: None,
  };
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<'a, T> {
  Found(&'a T),
  Ambiguous(Vec<&'a T>),
  NoMatch,
}

impl<'a, T> Outcome<'a, T> {
  fn from_matches(mut matches: Vec<&'a T>) -> Self {
    match matches.len() {
      0 => Outcome::NoMatch,
      1 => Outcome::Found(matches.remove(0)),
      _ => Outcome::Ambiguous(matches),
    }
  }
}

fn exact_name<'a, T: Candidate>(candidates: &'a [T], name: &str) -> Vec<&'a T> {
  let needle = name.to_lowercase();
  candidates
    .iter()
    .filter(|c| c.names().iter().any(|n| n.to_lowercase() == needle))
    .collect()
}

/// Apply the matching rules in order against one candidate list.
pub fn match_candidates<'a, T: Candidate>(
  candidates: &'a [T],
  identifier: &str,
  rules: Rules<'_>,
) -> Outcome<'a, T> {
  if rules.by_id {
    if let Some(found) = candidates.iter().find(|c| c.id() == identifier) {
      return Outcome::Found(found);
    }
    let referenced: Vec<&T> = candidates
      .iter()
      .filter(|c| c.matches_reference(identifier))
      .collect();
    if !referenced.is_empty() {
      return Outcome::from_matches(referenced);
    }
  }

  if let Some(target) = rules.aliases.and_then(|a| a.target(identifier)) {
    // An alias whose target was renamed must not fall through to fuzzy matching
    return Outcome::from_matches(exact_name(candidates, target));
  }

  let exact = exact_name(candidates, identifier);
  if !exact.is_empty() {
    return Outcome::from_matches(exact);
  }

  let needle = identifier.to_lowercase();
  Outcome::from_matches(
    candidates
      .iter()
      .filter(|c| c.names().iter().any(|n| n.to_lowercase().contains(&needle)))
      .collect(),
  )
}

/// Match and turn the outcome into an owned result or a typed error.
pub fn pick<T: Candidate + Clone>(
  candidates: &[T],
  identifier: &str,
  rules: Rules<'_>,
) -> Result<T, ResolveError> {
  match match_candidates(candidates, identifier, rules) {
    Outcome::Found(found) => Ok(found.clone()),
    Outcome::Ambiguous(matches) => Err(ResolveError::Ambiguous(Ambiguity::new(
      identifier, &matches,
    ))),
    Outcome::NoMatch => Err(ResolveError::not_found(T::KIND, identifier)),
  }
}

/// Trimmed identifier, rejecting blank input.
fn require(kind: EntityKind, identifier: &str) -> Result<&str, ResolveError> {
  let trimmed = identifier.trim();
  if trimmed.is_empty() {
    return Err(ResolveError::usage(format!("empty {} identifier", kind)));
  }
  Ok(trimmed)
}

/// Resolves identifiers for one workspace.
///
/// The network client and cache are passed in, so tests build a fresh
/// resolver around a mock client and an in-memory cache.
pub struct Resolver<'a, C> {
  client: &'a C,
  cache: &'a CacheLayer,
  workspace_id: &'a str,
}

impl<'a, C: GraphqlExecutor> Resolver<'a, C> {
  pub fn new(client: &'a C, cache: &'a CacheLayer, workspace_id: &'a str) -> Self {
    Self {
      client,
      cache,
      workspace_id,
    }
  }

  /// Decide against the cached list, refreshing once when it has no match.
  async fn resolve_listed<T, F, Fut, D>(&self, fetch: F, decide: D) -> Result<T, ResolveError>
  where
    T: Cacheable,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ClientError>>,
    D: Fn(&[T]) -> Result<T, ResolveError>,
  {
    let key = CacheKey::of::<T>(self.workspace_id);
    let listing = self.cache.fetch_list(&key, || fetch()).await?;

    match decide(&listing.data) {
      Err(ResolveError::NotFound { .. }) if listing.is_cached() => {
        debug!(%key, "no match in cached list, refreshing");
        let fresh = self.cache.refresh(&key, || fetch()).await?;
        decide(&fresh.data)
      }
      result => result,
    }
  }
}
