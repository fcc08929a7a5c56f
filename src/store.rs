//! Snapshot and audit-trail storage backed by SQLite.
//!
//! Two namespaces share one database file: `snapshots` is the keyed
//! subject store read at the start of each run and overwritten at the
//! end, `page_audit` is an append-only record of raw page captures with
//! no read path in this pipeline.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Keyed string store for subject snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Store `value` under `key`, overwriting any previous value.
    fn put(&self, key: &str, value: &str) -> Result<()>;
    /// List stored keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Append-only raw page capture store (audit trail, write-only).
pub trait AuditStore: Send + Sync {
    /// Record a raw page capture under `key`.
    fn put_capture(&self, key: &str, content: &str) -> Result<()>;
}

/// SQLite-backed implementation of both stores.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Connection::open(path)
            .with_context(|| format!("failed to open store: {}", path.display()))?;

        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS page_audit (
                key TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );",
        )
        .context("failed to create store tables")?;

        Ok(Self { db: Mutex::new(db) })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock means a prior panic mid-statement; propagating
        // the panic is the only sound option here.
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.conn();
        let value = db
            .query_row("SELECT value FROM snapshots WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .with_context(|| format!("failed to read snapshot {key}"))?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let db = self.conn();
        db.execute(
            "INSERT INTO snapshots (key, value, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP",
            [key, value],
        )
        .with_context(|| format!("failed to write snapshot {key}"))?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let db = self.conn();
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        let mut stmt = db.prepare(
            "SELECT key FROM snapshots WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key",
        )?;
        let keys = stmt
            .query_map([&pattern], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to list snapshot keys")?;
        Ok(keys)
    }
}

impl AuditStore for SqliteStore {
    fn put_capture(&self, key: &str, content: &str) -> Result<()> {
        let db = self.conn();
        db.execute(
            "INSERT OR REPLACE INTO page_audit (key, content) VALUES (?1, ?2)",
            [key, content],
        )
        .with_context(|| format!("failed to write page capture {key}"))?;
        Ok(())
    }
}
