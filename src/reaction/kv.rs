//! Persistent key-value storage for the reaction ledger.
//!
//! The ledger lives as one value under one well-known key, so the medium
//! only needs whole-value get/put/remove. [`SqliteKeyValueStore`] is the
//! production medium; [`MemoryKeyValueStore`] exists for tests.
//!
//! Both media can be given a per-value byte quota. A write above the quota
//! fails with [`ReactionError::CapacityExceeded`] and leaves the previous
//! value untouched.

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::error::{ReactionError, Result};

/// Whole-value key-value storage.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across threads.
pub trait KeyValueStore: Send + Sync {
    /// Retrieves the value for `key`.
    ///
    /// # Returns
    ///
    /// `Ok(Some(value))` if found, `Ok(None)` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any prior value.
    ///
    /// The replacement is atomic: readers see either the old or new value.
    ///
    /// # Errors
    ///
    /// Returns [`ReactionError::CapacityExceeded`] or
    /// [`ReactionError::StorageFull`] if the medium refuses the write, or
    /// another error if the write fails.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the value for `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

fn check_quota(key: &str, value: &str, limit: Option<usize>) -> Result<()> {
    match limit {
        Some(limit) if value.len() > limit => Err(ReactionError::CapacityExceeded {
            key: key.to_string(),
            size: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// `SQLite`-based key-value store.
///
/// Thread-safe wrapper around a `SQLite` connection holding a single
/// `kv_store` table.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
    max_value_bytes: Option<usize>,
}

impl SqliteKeyValueStore {
    /// Creates a new store at the given path.
    ///
    /// Creates the database file and table if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            max_value_bytes: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Creates an in-memory `SQLite` store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            max_value_bytes: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Limits the size of any single stored value.
    #[must_use]
    pub const fn with_max_value_bytes(mut self, limit: usize) -> Self {
        self.max_value_bytes = Some(limit);
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ReactionError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;

        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        check_quota(key, value, self.max_value_bytes)?;

        let conn = self.lock()?;

        conn.execute(
            r"
            INSERT INTO kv_store (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![key, value],
        )
        .map_err(|e| {
            if e.sqlite_error_code() == Some(ErrorCode::DiskFull) {
                ReactionError::StorageFull {
                    key: key.to_string(),
                    size: value.len(),
                }
            } else {
                ReactionError::Database(e)
            }
        })?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-memory key-value store for testing.
///
/// # Warning
///
/// Nothing is persisted. Only use this for testing.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<std::collections::HashMap<String, String>>,
    max_value_bytes: Option<usize>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the size of any single stored value.
    #[must_use]
    pub const fn with_max_value_bytes(mut self, limit: usize) -> Self {
        self.max_value_bytes = Some(limit);
        self
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|e| ReactionError::Storage(format!("Failed to acquire store lock: {e}")))?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        check_quota(key, value, self.max_value_bytes)?;
        let mut values = self
            .values
            .lock()
            .map_err(|e| ReactionError::Storage(format!("Failed to acquire store lock: {e}")))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| ReactionError::Storage(format!("Failed to acquire store lock: {e}")))?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_get_missing_returns_none() {
        let store = SqliteKeyValueStore::in_memory().unwrap();
        assert_eq!(store.get("absent").unwrap(), None);
    }

    #[test]
    fn sqlite_put_and_get() {
        let store = SqliteKeyValueStore::in_memory().unwrap();
        store.put("k", "v1").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));
    }

    #[test]
    fn sqlite_put_replaces_existing() {
        let store = SqliteKeyValueStore::in_memory().unwrap();
        store.put("k", "v1").unwrap();
        store.put("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn sqlite_remove() {
        let store = SqliteKeyValueStore::in_memory().unwrap();
        store.put("k", "v").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn sqlite_remove_missing_succeeds() {
        let store = SqliteKeyValueStore::in_memory().unwrap();
        assert!(store.remove("absent").is_ok());
    }

    #[test]
    fn sqlite_quota_rejects_and_keeps_previous_value() {
        let store = SqliteKeyValueStore::in_memory()
            .unwrap()
            .with_max_value_bytes(4);
        store.put("k", "abcd").unwrap();

        let err = store.put("k", "abcde").unwrap_err();

        assert!(matches!(
            err,
            ReactionError::CapacityExceeded {
                size: 5,
                limit: 4,
                ..
            }
        ));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("abcd"));
    }

    #[test]
    fn sqlite_disk_full_reports_storage_full() {
        let store = SqliteKeyValueStore::in_memory().unwrap();
        store.put("k", "small").unwrap();
        store
            .lock()
            .unwrap()
            .query_row("PRAGMA max_page_count = 4", [], |row| row.get::<_, i64>(0))
            .unwrap();

        let big = "x".repeat(64 * 1024);
        let err = store.put("k", &big).unwrap_err();

        assert!(matches!(err, ReactionError::StorageFull { size, .. } if size == big.len()));
        assert!(err.is_capacity_exceeded());
        assert!(!err.to_string().contains("limit"));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");

        {
            let store = SqliteKeyValueStore::new(&path).unwrap();
            store.put("k", "durable").unwrap();
        }

        let reopened = SqliteKeyValueStore::new(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("durable"));
    }

    #[test]
    fn memory_put_get_remove() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.put("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn memory_quota_rejects() {
        let store = MemoryKeyValueStore::new().with_max_value_bytes(2);
        let err = store.put("k", "abc").unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(store.get("k").unwrap(), None);
    }
}
