//! Workspace-scoped persistent cache for entity snapshots.
//!
//! This module knows nothing about ZenHub. It provides:
//! - Namespaced keys `(entity kind, workspace id)`
//! - Whole-snapshot entries with an embedded expiry, lazily evicted
//! - File, SQLite and no-op storage backends
//! - A typed layer that serves unexpired snapshots before going to the network

mod layer;
mod sqlite;
mod storage;
mod traits;

use color_eyre::Result;
use std::sync::Arc;

use crate::config::{CacheBackend, CacheConfig};

pub use layer::{CacheLayer, DEFAULT_TTL_MINUTES};
#[cfg(test)]
pub(crate) use layer::tests::{memory_cache, FailingStorage};
pub use sqlite::SqliteStorage;
pub use storage::{CacheStorage, FileStorage, NoopStorage};
pub use traits::{CacheKey, Cacheable, Namespace};

/// Open the storage backend selected in configuration.
pub fn open_storage(config: &CacheConfig) -> Result<Arc<dyn CacheStorage>> {
  let storage: Arc<dyn CacheStorage> = match config.backend {
    CacheBackend::File => match &config.dir {
      Some(dir) => Arc::new(FileStorage::open(dir)?),
      None => Arc::new(FileStorage::open_default()?),
    },
    CacheBackend::Sqlite => match &config.dir {
      Some(dir) => Arc::new(SqliteStorage::open(&dir.join("cache.db"))?),
      None => Arc::new(SqliteStorage::open_default()?),
    },
    CacheBackend::None => Arc::new(NoopStorage),
  };
  Ok(storage)
}

/// Build the cache layer described by configuration.
pub fn open(config: &CacheConfig) -> Result<CacheLayer> {
  Ok(CacheLayer::new(open_storage(config)?).with_ttl(config.ttl()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_open_each_backend() {
    let dir = tempfile::tempdir().unwrap();
    for backend in [CacheBackend::File, CacheBackend::Sqlite, CacheBackend::None] {
      let config = CacheConfig {
        backend,
        dir: Some(dir.path().join(format!("{:?}", backend))),
        ..CacheConfig::default()
      };
      let cache = open(&config).unwrap();
      cache.clear_workspace("ws1").unwrap();
    }
    assert!(dir.path().join("Sqlite").join("cache.db").exists());
  }
}
