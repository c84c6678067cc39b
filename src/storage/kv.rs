//! Key-value store backed by SQLite
//!
//! Holds the small amount of state that has to survive a restart: the bearer
//! credential, the assistant session id and the cached overview snapshot.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::error::{StoreError, StoreResult};

/// Key holding the bearer credential
pub const TOKEN_KEY: &str = "fitness_token";
/// Key holding the server-issued assistant session id
pub const ASSISTANT_SESSION_KEY: &str = "assistant_session_id";
/// Key holding the timestamped overview snapshot
pub const OVERVIEW_SNAPSHOT_KEY: &str = "overview_snapshot";

const DB_FILE: &str = "fitdash.db";

/// Process-wide persistent key-value store
pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open (or create) the store inside `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        let conn = Connection::open(data_dir.join(DB_FILE))?;
        Self::init_schema(&conn)?;

        tracing::debug!(path = ?data_dir, "Opened local store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Volatile store that disappears with the process
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Read a raw string value
    pub fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a raw string value
    pub fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    /// Delete a key. Returns whether it existed.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    /// Read and decode a JSON value
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode and store a JSON value
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_get_remove() {
        let store = LocalStore::in_memory().unwrap();

        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);

        store.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        store.set(TOKEN_KEY, "def").unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("def"));

        assert!(store.remove(TOKEN_KEY).unwrap());
        assert!(!store.remove(TOKEN_KEY).unwrap());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_json_values() {
        let store = LocalStore::in_memory().unwrap();

        store.set_json("numbers", &vec![1, 2, 3]).unwrap();
        let numbers: Option<Vec<u32>> = store.get_json("numbers").unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        store.set("broken", "{not json").unwrap();
        let broken: StoreResult<Option<Vec<u32>>> = store.get_json("broken");
        assert!(matches!(broken, Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = LocalStore::open(dir.path()).unwrap();
            store.set(ASSISTANT_SESSION_KEY, "session-1").unwrap();
        }

        let store = LocalStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get(ASSISTANT_SESSION_KEY).unwrap().as_deref(),
            Some("session-1")
        );
    }
}
