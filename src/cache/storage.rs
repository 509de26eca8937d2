//! Cache storage trait and file-backed implementation.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

use super::traits::{CacheKey, StoredEntry};

/// Trait for cache storage backends.
///
/// Backends treat missing, corrupt and expired entries alike: `get` returns
/// `None`. Expired entries are left in place and overwritten by the next `set`.
pub trait CacheStorage: Send + Sync {
  /// Get the unexpired entry stored under `key`.
  fn get(&self, key: &CacheKey) -> Result<Option<StoredEntry>>;

  /// Replace the entry stored under `key`.
  fn set(&self, key: &CacheKey, entry: &StoredEntry) -> Result<()>;

  /// Remove the entry stored under `key`, if any.
  fn clear(&self, key: &CacheKey) -> Result<()>;

  /// Remove every entry belonging to `workspace_id`, whatever its namespace.
  fn clear_workspace(&self, workspace_id: &str) -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &CacheKey) -> Result<Option<StoredEntry>> {
    Ok(None) // Always miss
  }

  fn set(&self, _key: &CacheKey, _entry: &StoredEntry) -> Result<()> {
    Ok(()) // Discard
  }

  fn clear(&self, _key: &CacheKey) -> Result<()> {
    Ok(())
  }

  fn clear_workspace(&self, _workspace_id: &str) -> Result<()> {
    Ok(())
  }
}

/// One JSON file per `(namespace, workspace)` pair.
///
/// Layout: `<root>/<sha256(workspace id)>/<namespace>.json`. Writes go to a
/// per-process temp file that is renamed over the entry, so concurrent
/// readers see either the old or the new snapshot.
pub struct FileStorage {
  root: PathBuf,
}

impl FileStorage {
  /// Open (and create if needed) a file store rooted at `root`.
  pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    fs::create_dir_all(&root)
      .map_err(|e| eyre!("Failed to create cache directory {}: {}", root.display(), e))?;
    Ok(Self { root })
  }

  /// Open a file store at the default location.
  pub fn open_default() -> Result<Self> {
    Self::open(default_cache_dir()?)
  }

  fn workspace_dir(&self, workspace_id: &str) -> PathBuf {
    let digest = Sha256::digest(workspace_id.as_bytes());
    self.root.join(hex::encode(digest))
  }

  fn entry_path(&self, key: &CacheKey) -> PathBuf {
    self
      .workspace_dir(&key.workspace_id)
      .join(format!("{}.json", key.namespace))
  }
}

impl CacheStorage for FileStorage {
  fn get(&self, key: &CacheKey) -> Result<Option<StoredEntry>> {
    let path = self.entry_path(key);
    let bytes = match fs::read(&path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(eyre!("Failed to read cache entry {}: {}", path.display(), e)),
    };

    let entry: StoredEntry = match serde_json::from_slice(&bytes) {
      Ok(entry) => entry,
      Err(e) => {
        debug!(%key, error = %e, "ignoring unreadable cache entry");
        return Ok(None);
      }
    };

    if entry.is_expired(Utc::now()) {
      debug!(%key, "cache entry expired");
      return Ok(None);
    }
    Ok(Some(entry))
  }

  fn set(&self, key: &CacheKey, entry: &StoredEntry) -> Result<()> {
    let path = self.entry_path(key);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory {}: {}", parent.display(), e))?;
    }

    let data =
      serde_json::to_vec(entry).map_err(|e| eyre!("Failed to serialize cache entry: {}", e))?;
    let temp_path = path.with_extension(format!("json.{}.tmp", std::process::id()));

    fs::write(&temp_path, &data)
      .map_err(|e| eyre!("Failed to write cache entry to {}: {}", temp_path.display(), e))?;

    fs::rename(&temp_path, &path).map_err(|e| {
      let _ = fs::remove_file(&temp_path);
      eyre!("Failed to move cache entry into {}: {}", path.display(), e)
    })?;

    Ok(())
  }

  fn clear(&self, key: &CacheKey) -> Result<()> {
    let path = self.entry_path(key);
    match fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(eyre!("Failed to remove cache entry {}: {}", path.display(), e)),
    }
  }

  fn clear_workspace(&self, workspace_id: &str) -> Result<()> {
    let dir = self.workspace_dir(workspace_id);
    match fs::remove_dir_all(&dir) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(eyre!("Failed to clear cache directory {}: {}", dir.display(), e)),
    }
  }
}

/// Get the default cache directory.
pub fn default_cache_dir() -> Result<PathBuf> {
  let cache_dir = dirs::cache_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
    .ok_or_else(|| eyre!("Could not determine cache directory"))?;

  Ok(cache_dir.join("zh"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::traits::Namespace;
  use chrono::{Duration, Utc};
  use serde_json::json;

  fn entry(records: serde_json::Value) -> StoredEntry {
    StoredEntry {
      expires_at: Utc::now() + Duration::hours(1),
      records,
    }
  }

  #[test]
  fn test_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path()).unwrap();
    let key = CacheKey::new(Namespace::Pipelines, "ws1");

    assert_eq!(store.get(&key).unwrap(), None);
    let stored = entry(json!([{"id": "p1", "name": "Backlog"}]));
    store.set(&key, &stored).unwrap();
    assert_eq!(store.get(&key).unwrap(), Some(stored));
  }

  #[test]
  fn test_set_overwrites_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path()).unwrap();
    let key = CacheKey::new(Namespace::Labels, "ws1");

    store.set(&key, &entry(json!([{"id": "l1"}]))).unwrap();
    store.set(&key, &entry(json!([{"id": "l2"}]))).unwrap();
    let got = store.get(&key).unwrap().unwrap();
    assert_eq!(got.records, json!([{"id": "l2"}]));
  }

  #[test]
  fn test_no_temp_file_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path()).unwrap();
    let key = CacheKey::new(Namespace::Epics, "ws1");
    store.set(&key, &entry(json!([]))).unwrap();

    let ws_dir = store.workspace_dir("ws1");
    let names: Vec<String> = fs::read_dir(ws_dir)
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, vec!["epics.json".to_string()]);
  }

  #[test]
  fn test_expired_entry_is_a_miss_but_not_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path()).unwrap();
    let key = CacheKey::new(Namespace::Sprints, "ws1");
    let expired = StoredEntry {
      expires_at: Utc::now() - Duration::minutes(1),
      records: json!([]),
    };
    store.set(&key, &expired).unwrap();

    assert_eq!(store.get(&key).unwrap(), None);
    assert!(store.entry_path(&key).exists());
  }

  #[test]
  fn test_corrupt_entry_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path()).unwrap();
    let key = CacheKey::new(Namespace::Repos, "ws1");
    let path = store.entry_path(&key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"{\"expires_at\": \"not-a-da").unwrap();

    assert_eq!(store.get(&key).unwrap(), None);
  }

  #[test]
  fn test_clear_removes_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path()).unwrap();
    let pipelines = CacheKey::new(Namespace::Pipelines, "ws1");
    let epics = CacheKey::new(Namespace::Epics, "ws1");
    store.set(&pipelines, &entry(json!([]))).unwrap();
    store.set(&epics, &entry(json!([]))).unwrap();

    store.clear(&pipelines).unwrap();
    store.clear(&pipelines).unwrap();
    assert_eq!(store.get(&pipelines).unwrap(), None);
    assert!(store.get(&epics).unwrap().is_some());
  }

  #[test]
  fn test_clear_workspace_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path()).unwrap();
    for ns in Namespace::ALL {
      store.set(&CacheKey::new(ns, "A"), &entry(json!([]))).unwrap();
      store.set(&CacheKey::new(ns, "B"), &entry(json!([]))).unwrap();
    }

    store.clear_workspace("A").unwrap();

    for ns in Namespace::ALL {
      assert_eq!(store.get(&CacheKey::new(ns, "A")).unwrap(), None);
      assert!(store.get(&CacheKey::new(ns, "B")).unwrap().is_some());
    }
    // Clearing an unknown workspace is not an error
    store.clear_workspace("never-seen").unwrap();
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let store = NoopStorage;
    let key = CacheKey::new(Namespace::Pipelines, "ws1");
    store.set(&key, &entry(json!([1]))).unwrap();
    assert_eq!(store.get(&key).unwrap(), None);
  }
}
