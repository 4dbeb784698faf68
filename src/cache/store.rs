//! Cache store trait and backends.
//!
//! A store holds named collections of (URL -> stored response) pairs. One
//! collection per cache generation; the manager never mixes generations.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::types::{AssetResponse, ResponseKind};

/// Trait for cache storage backends.
pub trait CacheStore: Send + Sync {
  /// Names of every collection currently present.
  fn list_collections(&self) -> Result<Vec<String>>;

  /// Remove a collection and all of its entries. Unknown names are a no-op.
  fn delete_collection(&self, name: &str) -> Result<()>;

  /// Look up a stored response by URL.
  fn get(&self, collection: &str, url: &str) -> Result<Option<AssetResponse>>;

  /// Store a single response, creating the collection if needed.
  fn put(&self, collection: &str, url: &str, response: &AssetResponse) -> Result<()>;

  /// Store a batch atomically: the collection appears with every entry or
  /// not at all.
  fn put_all(&self, collection: &str, entries: &[(String, AssetResponse)]) -> Result<()>;
}

/// Response metadata persisted alongside the body.
#[derive(Serialize, Deserialize)]
struct ResponseMeta {
  status: u16,
  kind: ResponseKind,
  content_type: Option<String>,
}

impl ResponseMeta {
  fn of(response: &AssetResponse) -> Self {
    Self {
      status: response.status,
      kind: response.kind,
      content_type: response.content_type.clone(),
    }
  }
}

/// In-memory store. Backs tests and cache-disabled runs; contents die with
/// the process.
#[derive(Default)]
pub struct MemoryStore {
  collections: Mutex<BTreeMap<String, BTreeMap<String, AssetResponse>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStore for MemoryStore {
  fn list_collections(&self) -> Result<Vec<String>> {
    let collections = self
      .collections
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(collections.keys().cloned().collect())
  }

  fn delete_collection(&self, name: &str) -> Result<()> {
    let mut collections = self
      .collections
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    collections.remove(name);
    Ok(())
  }

  fn get(&self, collection: &str, url: &str) -> Result<Option<AssetResponse>> {
    let collections = self
      .collections
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(
      collections
        .get(collection)
        .and_then(|entries| entries.get(url))
        .cloned(),
    )
  }

  fn put(&self, collection: &str, url: &str, response: &AssetResponse) -> Result<()> {
    let mut collections = self
      .collections
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    collections
      .entry(collection.to_string())
      .or_default()
      .insert(url.to_string(), response.clone());
    Ok(())
  }

  fn put_all(&self, collection: &str, entries: &[(String, AssetResponse)]) -> Result<()> {
    let mut collections = self
      .collections
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let bucket = collections.entry(collection.to_string()).or_default();
    for (url, response) in entries {
      bucket.insert(url.clone(), response.clone());
    }
    Ok(())
  }
}

/// SQLite-backed store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open asset cache at {}: {}", path.display(), e))?;

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("watchdeck").join("assets.db"))
  }

  #[cfg(test)]
  fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory store: {}", e))?;
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for the asset cache.
const STORE_SCHEMA: &str = r#"
-- One row per cache generation
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Stored responses, keyed by URL within a collection
CREATE TABLE IF NOT EXISTS assets (
    collection TEXT NOT NULL,
    url TEXT NOT NULL,
    meta TEXT NOT NULL,
    body BLOB NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (collection, url)
);

CREATE INDEX IF NOT EXISTS idx_assets_collection ON assets(collection);
"#;

impl SqliteStore {
  fn insert_entry(
    conn: &Connection,
    collection: &str,
    url: &str,
    response: &AssetResponse,
  ) -> Result<()> {
    let meta = serde_json::to_string(&ResponseMeta::of(response))
      .map_err(|e| eyre!("Failed to serialize response metadata: {}", e))?;

    conn
      .execute(
        "INSERT OR IGNORE INTO collections (name) VALUES (?)",
        params![collection],
      )
      .map_err(|e| eyre!("Failed to record collection: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO assets (collection, url, meta, body, stored_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![collection, url, meta, response.body],
      )
      .map_err(|e| eyre!("Failed to store asset {}: {}", url, e))?;

    Ok(())
  }
}

impl CacheStore for SqliteStore {
  fn list_collections(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT name FROM collections ORDER BY name")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get::<_, String>(0))
      .map_err(|e| eyre!("Failed to list collections: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(names)
  }

  fn delete_collection(&self, name: &str) -> Result<()> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute("DELETE FROM assets WHERE collection = ?", params![name])
      .map_err(|e| eyre!("Failed to delete collection entries: {}", e))?;
    tx.execute("DELETE FROM collections WHERE name = ?", params![name])
      .map_err(|e| eyre!("Failed to delete collection: {}", e))?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn get(&self, collection: &str, url: &str) -> Result<Option<AssetResponse>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT meta, body FROM assets WHERE collection = ? AND url = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(String, Vec<u8>)> = stmt
      .query_row(params![collection, url], |row| {
        Ok((row.get(0)?, row.get(1)?))
      })
      .ok();

    match row {
      Some((meta_json, body)) => {
        let meta: ResponseMeta = serde_json::from_str(&meta_json)
          .map_err(|e| eyre!("Failed to parse response metadata: {}", e))?;
        Ok(Some(AssetResponse {
          status: meta.status,
          kind: meta.kind,
          content_type: meta.content_type,
          body,
        }))
      }
      None => Ok(None),
    }
  }

  fn put(&self, collection: &str, url: &str, response: &AssetResponse) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    Self::insert_entry(&conn, collection, url, response)
  }

  fn put_all(&self, collection: &str, entries: &[(String, AssetResponse)]) -> Result<()> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    for (url, response) in entries {
      Self::insert_entry(&tx, collection, url, response)?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }
}
