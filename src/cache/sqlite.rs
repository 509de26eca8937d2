//! SQLite-backed cache storage.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use super::storage::{default_cache_dir, CacheStorage};
use super::traits::{CacheKey, StoredEntry};

/// How long a writer waits on another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- One serialized snapshot per (namespace, workspace)
CREATE TABLE IF NOT EXISTS cache_entries (
    namespace TEXT NOT NULL,
    workspace_id TEXT NOT NULL,
    records BLOB NOT NULL,
    expires_at TEXT NOT NULL,
    PRIMARY KEY (namespace, workspace_id)
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_workspace
    ON cache_entries(workspace_id);
"#;

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the cache database at the default location.
  pub fn open_default() -> Result<Self> {
    Self::open(&default_cache_dir()?.join("cache.db"))
  }

  /// Open (and create if needed) the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a private in-memory database.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .busy_timeout(BUSY_TIMEOUT)
      .map_err(|e| eyre!("Failed to configure cache database: {}", e))?;
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl CacheStorage for SqliteStorage {
  fn get(&self, key: &CacheKey) -> Result<Option<StoredEntry>> {
    let conn = self.lock()?;

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT records, expires_at FROM cache_entries
         WHERE namespace = ? AND workspace_id = ?",
        params![key.namespace.as_str(), key.workspace_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry {}: {}", key, e))?;

    let Some((data, expires_at)) = row else {
      return Ok(None);
    };

    let expires_at = match DateTime::parse_from_rfc3339(&expires_at) {
      Ok(ts) => ts.with_timezone(&Utc),
      Err(e) => {
        debug!(%key, error = %e, "ignoring cache entry with bad expiry");
        return Ok(None);
      }
    };
    let records = match serde_json::from_slice(&data) {
      Ok(records) => records,
      Err(e) => {
        debug!(%key, error = %e, "ignoring unreadable cache entry");
        return Ok(None);
      }
    };

    let entry = StoredEntry {
      expires_at,
      records,
    };
    if entry.is_expired(Utc::now()) {
      debug!(%key, "cache entry expired");
      return Ok(None);
    }
    Ok(Some(entry))
  }

  fn set(&self, key: &CacheKey, entry: &StoredEntry) -> Result<()> {
    let conn = self.lock()?;
    let data = serde_json::to_vec(&entry.records)
      .map_err(|e| eyre!("Failed to serialize cache entry: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO cache_entries (namespace, workspace_id, records, expires_at)
         VALUES (?, ?, ?, ?)",
        params![
          key.namespace.as_str(),
          key.workspace_id,
          data,
          entry.expires_at.to_rfc3339()
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry {}: {}", key, e))?;

    Ok(())
  }

  fn clear(&self, key: &CacheKey) -> Result<()> {
    let conn = self.lock()?;
    conn
      .execute(
        "DELETE FROM cache_entries WHERE namespace = ? AND workspace_id = ?",
        params![key.namespace.as_str(), key.workspace_id],
      )
      .map_err(|e| eyre!("Failed to clear cache entry {}: {}", key, e))?;
    Ok(())
  }

  fn clear_workspace(&self, workspace_id: &str) -> Result<()> {
    let conn = self.lock()?;
    conn
      .execute(
        "DELETE FROM cache_entries WHERE workspace_id = ?",
        params![workspace_id],
      )
      .map_err(|e| eyre!("Failed to clear cache for workspace {}: {}", workspace_id, e))?;
    Ok(())
  }
}
