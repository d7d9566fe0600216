//! Bucket storage trait and SQLite implementation.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use super::snapshot::ResponseSnapshot;

/// Trait for bucket storage backends.
///
/// Writes are last-write-wins per key; a put is atomic per key. Store calls
/// never block the response path - callers treat failures as best-effort.
pub trait BucketStore: Send + Sync {
  /// Ensure a bucket exists (a bucket with no entries is still listed).
  fn open_bucket(&self, bucket: &str) -> Result<()>;

  /// Store a snapshot under a request key. Replaces any prior entry.
  fn put(&self, bucket: &str, key: &str, identity: &str, snapshot: &ResponseSnapshot)
    -> Result<()>;

  /// Look up a snapshot by request key.
  fn get(&self, bucket: &str, key: &str) -> Result<Option<ResponseSnapshot>>;

  /// Names of all existing buckets, current and superseded.
  fn list_buckets(&self) -> Result<Vec<String>>;

  /// Delete a bucket and all its entries.
  fn delete_bucket(&self, bucket: &str) -> Result<()>;

  /// Delete every bucket and entry.
  fn clear_all(&self) -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - lookups always miss, puts discard.
pub struct NoopStore;

impl BucketStore for NoopStore {
  fn open_bucket(&self, _bucket: &str) -> Result<()> {
    Ok(())
  }

  fn put(
    &self,
    _bucket: &str,
    _key: &str,
    _identity: &str,
    _snapshot: &ResponseSnapshot,
  ) -> Result<()> {
    Ok(()) // Discard
  }

  fn get(&self, _bucket: &str, _key: &str) -> Result<Option<ResponseSnapshot>> {
    Ok(None) // Always miss
  }

  fn list_buckets(&self) -> Result<Vec<String>> {
    Ok(Vec::new())
  }

  fn delete_bucket(&self, _bucket: &str) -> Result<()> {
    Ok(())
  }

  fn clear_all(&self) -> Result<()> {
    Ok(())
  }
}

/// SQLite-based bucket storage.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    Self::open_at(&path)
  }

  /// Open the store at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;
    Self::from_connection(conn)
  }

  /// In-memory store, used by tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory store: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Default database path under the platform data directory.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("offgate").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(BUCKET_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for bucket tables.
const BUCKET_SCHEMA: &str = r#"
-- Bucket registry (a bucket exists even before its first entry)
CREATE TABLE IF NOT EXISTS buckets (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Response snapshots (stored as serialized JSON)
CREATE TABLE IF NOT EXISTS response_cache (
    bucket TEXT NOT NULL,
    key TEXT NOT NULL,
    identity TEXT NOT NULL,
    snapshot BLOB NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (bucket, key)
);

CREATE INDEX IF NOT EXISTS idx_response_cache_bucket ON response_cache(bucket);
"#;

impl BucketStore for SqliteStore {
  fn open_bucket(&self, bucket: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR IGNORE INTO buckets (name) VALUES (?)",
        params![bucket],
      )
      .map_err(|e| eyre!("Failed to open bucket {}: {}", bucket, e))?;

    Ok(())
  }

  fn put(
    &self,
    bucket: &str,
    key: &str,
    identity: &str,
    snapshot: &ResponseSnapshot,
  ) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let data =
      serde_json::to_vec(snapshot).map_err(|e| eyre!("Failed to serialize snapshot: {}", e))?;

    conn
      .execute(
        "INSERT OR IGNORE INTO buckets (name) VALUES (?)",
        params![bucket],
      )
      .map_err(|e| eyre!("Failed to register bucket: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO response_cache (bucket, key, identity, snapshot, stored_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![bucket, key, identity, data],
      )
      .map_err(|e| eyre!("Failed to store snapshot for {}: {}", identity, e))?;

    Ok(())
  }

  fn get(&self, bucket: &str, key: &str) -> Result<Option<ResponseSnapshot>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT snapshot FROM response_cache WHERE bucket = ? AND key = ?")
      .map_err(|e| eyre!("Failed to prepare lookup: {}", e))?;

    let data: Option<Vec<u8>> = stmt.query_row(params![bucket, key], |row| row.get(0)).ok();

    match data {
      Some(data) => {
        let snapshot: ResponseSnapshot = serde_json::from_slice(&data)
          .map_err(|e| eyre!("Failed to deserialize snapshot: {}", e))?;
        Ok(Some(snapshot))
      }
      None => Ok(None),
    }
  }

  fn list_buckets(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT name FROM buckets ORDER BY name")
      .map_err(|e| eyre!("Failed to prepare bucket listing: {}", e))?;

    let names: Vec<String> = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list buckets: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(names)
  }

  fn delete_bucket(&self, bucket: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "DELETE FROM response_cache WHERE bucket = ?",
        params![bucket],
      )
      .map_err(|e| eyre!("Failed to delete bucket entries: {}", e))?;

    conn
      .execute("DELETE FROM buckets WHERE name = ?", params![bucket])
      .map_err(|e| eyre!("Failed to delete bucket {}: {}", bucket, e))?;

    Ok(())
  }

  fn clear_all(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch("DELETE FROM response_cache; DELETE FROM buckets;")
      .map_err(|e| eyre!("Failed to clear cache: {}", e))?;

    Ok(())
  }
}
