//! SQLite-backed blob store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{BlobStore, StoreError};

/// SQLite-backed blob store.
pub struct SqliteBlobStore {
    conn: Mutex<Connection>,
}

impl SqliteBlobStore {
    /// Create a new SQLite blob store, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite blob store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl BlobStore for SqliteBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT value FROM blobs WHERE key = ?",
            params![key],
            |row| row.get::<_, Vec<u8>>(0),
        );

        match result {
            Ok(bytes) => Ok(Some(bytes)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO blobs (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, bytes, Utc::now().to_rfc3339()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteBlobStore {
        SqliteBlobStore::in_memory().unwrap()
    }

    #[test]
    fn test_load_missing_key() {
        let store = create_test_store();
        assert!(store.load("nope").unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let store = create_test_store();
        store.save("draft:1:1:category", b"{\"finished\":false}").unwrap();

        let loaded = store.load("draft:1:1:category").unwrap().unwrap();
        assert_eq!(loaded, b"{\"finished\":false}");
    }

    #[test]
    fn test_save_overwrites() {
        let store = create_test_store();
        store.save("k", b"one").unwrap();
        store.save("k", b"two").unwrap();

        assert_eq!(store.load("k").unwrap().unwrap(), b"two");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("brackets.db");

        {
            let store = SqliteBlobStore::new(&db_path).unwrap();
            store.save("k", b"persisted").unwrap();
        }

        // Verify file was created
        assert!(db_path.exists());

        // Verify a fresh connection sees the record
        let reopened = SqliteBlobStore::new(&db_path).unwrap();
        assert_eq!(reopened.load("k").unwrap().unwrap(), b"persisted");
    }
}
