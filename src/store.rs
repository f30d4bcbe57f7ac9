use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{PortalError, Result};

/// Fixed keys for every persisted entity.
pub mod keys {
    pub const CURRENT: &str = "cn-current-v2";
    pub const USERS: &str = "cn-users-index-v2";
    pub const SEED: &str = "cn-seeded-v4";
    pub const JOBS: &str = "cn-jobs-v2";
    pub const JOBS_MINE: &str = "cn-jobs-mine";
    pub const APPS: &str = "cn-applications-v2";
    pub const SAVED: &str = "cn-saved-jobs-v2";
    pub const MSGS: &str = "cn-messages-v2";
    pub const COMP: &str = "cn-companies-v2";
    pub const NOTIF: &str = "cn-notifications-v2";
    pub const RESET: &str = "cn-reset-ticket";
    pub const VERSION: &str = "cn-version";

    pub const USER_PREFIX: &str = "cn-user-";
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Local key-value store. One row per key, values are JSON text.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PortalError::Validation(format!(
                        "Cannot create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        // a writer holding the file lock makes others wait rather than fail
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    // --- Raw access ---

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        write_raw(&self.conn, key, value)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        debug!(key, "remove");
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })?;
        Ok(count > 0)
    }

    // --- JSON access ---

    /// Missing key is `None`; a value that fails to decode is an error.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(PortalError::Encode)?;
        self.set_raw(key, &raw)
    }

    /// Read-modify-write of one value inside an immediate transaction, so a
    /// second writer on the same file waits instead of overwriting.
    pub fn update<T, R, F>(&self, key: &str, default: T, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let current: Option<String> = tx
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        let mut value = match current {
            Some(raw) => decode(key, &raw)?,
            None => default,
        };
        let out = f(&mut value)?;
        let raw = serde_json::to_string(&value).map_err(PortalError::Encode)?;
        write_raw(&tx, key, &raw)?;
        tx.commit()?;
        Ok(out)
    }
}

fn write_raw(conn: &Connection, key: &str, value: &str) -> Result<()> {
    debug!(key, bytes = value.len(), "write");
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| PortalError::Decode {
        key: key.to_string(),
        source,
    })
}
