//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Entity kind component of a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
  Pipelines,
  Epics,
  Sprints,
  Repos,
  Labels,
  Priorities,
}

impl Namespace {
  pub const ALL: [Namespace; 6] = [
    Namespace::Pipelines,
    Namespace::Epics,
    Namespace::Sprints,
    Namespace::Repos,
    Namespace::Labels,
    Namespace::Priorities,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Namespace::Pipelines => "pipelines",
      Namespace::Epics => "epics",
      Namespace::Sprints => "sprints",
      Namespace::Repos => "repos",
      Namespace::Labels => "labels",
      Namespace::Priorities => "priorities",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|ns| ns.as_str() == s)
  }
}

impl fmt::Display for Namespace {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Key of one cache entry: an entity kind scoped to a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  pub namespace: Namespace,
  pub workspace_id: String,
}

impl CacheKey {
  pub fn new(namespace: Namespace, workspace_id: impl Into<String>) -> Self {
    Self {
      namespace,
      workspace_id: workspace_id.into(),
    }
  }

  /// Key for the namespace a cacheable record type lives in.
  pub fn of<T: Cacheable>(workspace_id: impl Into<String>) -> Self {
    Self::new(T::namespace(), workspace_id)
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.namespace, self.workspace_id)
  }
}

/// Serialized snapshot as persisted by a storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
  pub expires_at: DateTime<Utc>,
  pub records: serde_json::Value,
}

impl StoredEntry {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now >= self.expires_at
  }
}

/// Trait for records that can be cached.
///
/// Records in one entry are unique by `cache_key`.
pub trait Cacheable: Clone + Serialize + DeserializeOwned {
  /// Unique identifier for this record within its namespace
  fn cache_key(&self) -> &str;

  /// Namespace the record is stored under
  fn namespace() -> Namespace;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }

  pub fn is_cached(&self) -> bool {
    self.source == CacheSource::Cache
  }
}

/// Indicates where data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Unexpired data from the local cache, possibly stale
  Cache,
}
