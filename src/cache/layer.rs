//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::CacheStorage;
use super::traits::{CacheKey, CacheResult, Cacheable, StoredEntry};

/// Default time-to-live for every namespace.
pub const DEFAULT_TTL_MINUTES: i64 = 60;

/// Cache layer that manages expiry, typed snapshots and network fetching.
///
/// Reads and writes on the resolution path are best-effort: a storage failure
/// is logged and behaves like a miss, it never fails the command.
#[derive(Clone)]
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  /// How long a written snapshot stays valid
  ttl: Duration,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
    Self {
      storage,
      ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
    }
  }

  /// Set the time-to-live for written snapshots.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Load the unexpired snapshot stored under `key`.
  pub fn load<T: Cacheable>(&self, key: &CacheKey) -> Option<Vec<T>> {
    let entry = match self.storage.get(key) {
      Ok(Some(entry)) => entry,
      Ok(None) => {
        debug!(%key, "cache miss");
        return None;
      }
      Err(e) => {
        warn!(%key, error = %e, "cache read failed");
        return None;
      }
    };

    match serde_json::from_value(entry.records) {
      Ok(records) => {
        debug!(%key, "cache hit");
        Some(records)
      }
      Err(e) => {
        debug!(%key, error = %e, "cached records no longer decode");
        None
      }
    }
  }

  /// Store a snapshot, logging rather than returning failures.
  pub fn save<T: Cacheable>(&self, key: &CacheKey, records: &[T]) {
    if let Err(e) = self.store(key, records) {
      warn!(%key, error = %e, "cache write failed");
    }
  }

  /// Populate the cache from a complete listing fetched elsewhere.
  pub fn fetch_into_cache<T: Cacheable>(&self, records: &[T], workspace_id: &str) -> Result<()> {
    self.store(&CacheKey::of::<T>(workspace_id), records)
  }

  fn store<T: Cacheable>(&self, key: &CacheKey, records: &[T]) -> Result<()> {
    let mut seen = HashSet::new();
    let unique: Vec<&T> = records
      .iter()
      .filter(|r| seen.insert(r.cache_key().to_string()))
      .collect();

    let entry = StoredEntry {
      expires_at: Utc::now() + self.ttl,
      records: serde_json::to_value(&unique)
        .map_err(|e| eyre!("Failed to serialize {} records: {}", key.namespace, e))?,
    };
    self.storage.set(key, &entry)
  }

  /// Fetch a list with cache-first strategy.
  ///
  /// 1. Check cache - if unexpired, return it without touching the network
  /// 2. If expired/missing, fetch from network
  /// 3. Update cache with new data
  pub async fn fetch_list<T, E, F, Fut>(
    &self,
    key: &CacheKey,
    fetcher: F,
  ) -> Result<CacheResult<Vec<T>>, E>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
  {
    if let Some(cached) = self.load(key) {
      return Ok(CacheResult::from_cache(cached));
    }
    self.refresh(key, fetcher).await
  }

  /// Fetch from the network and overwrite the cached snapshot.
  pub async fn refresh<T, E, F, Fut>(
    &self,
    key: &CacheKey,
    fetcher: F,
  ) -> Result<CacheResult<Vec<T>>, E>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
  {
    debug!(%key, "fetching from network");
    let data = fetcher().await?;
    self.save(key, &data);
    Ok(CacheResult::from_network(data))
  }

  /// Drop one entry. Failures are logged, never propagated.
  pub fn invalidate(&self, key: &CacheKey) {
    match self.storage.clear(key) {
      Ok(()) => debug!(%key, "cache entry invalidated"),
      Err(e) => warn!(%key, error = %e, "cache invalidation failed"),
    }
  }

  /// Drop every entry of a workspace. Failures are logged, never propagated.
  pub fn invalidate_workspace(&self, workspace_id: &str) {
    match self.storage.clear_workspace(workspace_id) {
      Ok(()) => debug!(workspace_id, "workspace cache invalidated"),
      Err(e) => warn!(workspace_id, error = %e, "workspace cache invalidation failed"),
    }
  }

  /// Drop every entry of a workspace, reporting failures to the caller.
  pub fn clear_workspace(&self, workspace_id: &str) -> Result<()> {
    self.storage.clear_workspace(workspace_id)
  }

  /// Drop one entry, reporting failures to the caller.
  pub fn clear(&self, key: &CacheKey) -> Result<()> {
    self.storage.clear(key)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::cache::storage::FileStorage;
  use crate::cache::traits::{CacheSource, Namespace};
  use serde::{Deserialize, Serialize};
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  /// Storage whose every operation fails, for exercising best-effort paths.
  pub(crate) struct FailingStorage;

  impl CacheStorage for FailingStorage {
    fn get(&self, _key: &CacheKey) -> Result<Option<StoredEntry>> {
      Err(eyre!("disk on fire"))
    }
    fn set(&self, _key: &CacheKey, _entry: &StoredEntry) -> Result<()> {
      Err(eyre!("disk on fire"))
    }
    fn clear(&self, _key: &CacheKey) -> Result<()> {
      Err(eyre!("disk on fire"))
    }
    fn clear_workspace(&self, _workspace_id: &str) -> Result<()> {
      Err(eyre!("disk on fire"))
    }
  }

  /// In-memory storage that honours expiry, shared by resolver tests.
  #[derive(Default)]
  pub(crate) struct MemoryStorage {
    entries: Mutex<Vec<(CacheKey, StoredEntry)>>,
  }

  impl CacheStorage for MemoryStorage {
    fn get(&self, key: &CacheKey) -> Result<Option<StoredEntry>> {
      let entries = self.entries.lock().unwrap();
      Ok(
        entries
          .iter()
          .find(|(k, _)| k == key)
          .map(|(_, e)| e.clone())
          .filter(|e| !e.is_expired(Utc::now())),
      )
    }
    fn set(&self, key: &CacheKey, entry: &StoredEntry) -> Result<()> {
      let mut entries = self.entries.lock().unwrap();
      entries.retain(|(k, _)| k != key);
      entries.push((key.clone(), entry.clone()));
      Ok(())
    }
    fn clear(&self, key: &CacheKey) -> Result<()> {
      self.entries.lock().unwrap().retain(|(k, _)| k != key);
      Ok(())
    }
    fn clear_workspace(&self, workspace_id: &str) -> Result<()> {
      self
        .entries
        .lock()
        .unwrap()
        .retain(|(k, _)| k.workspace_id != workspace_id);
      Ok(())
    }
  }

  pub(crate) fn memory_cache() -> CacheLayer {
    CacheLayer::new(Arc::new(MemoryStorage::default()))
  }

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Thing {
    id: String,
  }

  impl Cacheable for Thing {
    fn cache_key(&self) -> &str {
      &self.id
    }
    fn namespace() -> Namespace {
      Namespace::Labels
    }
  }

  fn thing(id: &str) -> Thing {
    Thing { id: id.to_string() }
  }

  #[tokio::test]
  async fn test_fetch_list_uses_cache_when_fresh() {
    let cache = memory_cache();
    let key = CacheKey::of::<Thing>("ws1");
    let calls = AtomicUsize::new(0);

    let first = cache
      .fetch_list(&key, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(vec![thing("a")])
      })
      .await
      .unwrap();
    assert_eq!(first.source, CacheSource::Network);

    let second = cache
      .fetch_list(&key, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(vec![thing("b")])
      })
      .await
      .unwrap();
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data, vec![thing("a")]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_expired_entry_refetches() {
    let cache = memory_cache().with_ttl(Duration::zero());
    let key = CacheKey::of::<Thing>("ws1");

    cache
      .fetch_list(&key, || async { Ok::<_, String>(vec![thing("a")]) })
      .await
      .unwrap();
    let again = cache
      .fetch_list(&key, || async { Ok::<_, String>(vec![thing("b")]) })
      .await
      .unwrap();
    assert_eq!(again.source, CacheSource::Network);
    assert_eq!(again.data, vec![thing("b")]);
  }

  #[tokio::test]
  async fn test_fetch_error_propagates_and_leaves_cache_alone() {
    let cache = memory_cache();
    let key = CacheKey::of::<Thing>("ws1");

    let err = cache
      .fetch_list(&key, || async { Err::<Vec<Thing>, _>("boom".to_string()) })
      .await
      .unwrap_err();
    assert_eq!(err, "boom");
    assert!(cache.load::<Thing>(&key).is_none());
  }

  #[test]
  fn test_save_deduplicates_by_id() {
    let cache = memory_cache();
    let key = CacheKey::of::<Thing>("ws1");
    cache.save(&key, &[thing("a"), thing("b"), thing("a")]);
    assert_eq!(
      cache.load::<Thing>(&key).unwrap(),
      vec![thing("a"), thing("b")]
    );
  }

  #[test]
  fn test_fetch_into_cache_warms_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayer::new(Arc::new(FileStorage::open(dir.path()).unwrap()));
    cache.fetch_into_cache(&[thing("x")], "ws1").unwrap();
    assert_eq!(
      cache.load::<Thing>(&CacheKey::of::<Thing>("ws1")).unwrap(),
      vec![thing("x")]
    );
  }

  #[test]
  fn test_failing_storage_is_best_effort() {
    let cache = CacheLayer::new(Arc::new(FailingStorage));
    let key = CacheKey::of::<Thing>("ws1");

    assert!(cache.load::<Thing>(&key).is_none());
    cache.save(&key, &[thing("a")]);
    cache.invalidate(&key);
    cache.invalidate_workspace("ws1");
    assert!(cache.clear(&key).is_err());
    assert!(cache.fetch_into_cache(&[thing("a")], "ws1").is_err());
  }

  #[test]
  fn test_undecodable_records_are_a_miss() {
    let storage = Arc::new(MemoryStorage::default());
    let key = CacheKey::of::<Thing>("ws1");
    storage
      .set(
        &key,
        &StoredEntry {
          expires_at: Utc::now() + Duration::hours(1),
          records: serde_json::json!([{"unexpected": true}]),
        },
      )
      .unwrap();
    let cache = CacheLayer::new(storage);
    assert!(cache.load::<Thing>(&key).is_none());
  }
}
