//! Mock blob store for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::{BlobStore, StoreError};

/// Which keys an injected failure applies to.
#[derive(Debug, Clone)]
enum FailureScope {
    All,
    Prefix(String),
}

impl FailureScope {
    fn covers(&self, key: &str) -> bool {
        match self {
            FailureScope::All => true,
            FailureScope::Prefix(prefix) => key.starts_with(prefix.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
struct Failure {
    scope: FailureScope,
    message: String,
}

/// In-memory implementation of the BlobStore trait.
///
/// Provides controllable behavior for testing:
/// - Inspect stored records
/// - Fail loads or saves for every key or for a key prefix
/// - Count successful saves
///
/// # Example
///
/// ```rust,ignore
/// use bracket_core::testing::MockBlobStore;
///
/// let store = MockBlobStore::new();
/// store.fail_saves_with_prefix("bracket:", "disk full");
///
/// // Drafts still save, commits fail.
/// assert!(store.save("draft:1:1:category", b"{}").is_ok());
/// assert!(store.save("bracket:1:1:category", b"{}").is_err());
/// ```
#[derive(Debug, Default)]
pub struct MockBlobStore {
    records: Mutex<HashMap<String, Vec<u8>>>,
    load_failure: Mutex<Option<Failure>>,
    save_failure: Mutex<Option<Failure>>,
    saves: Mutex<usize>,
}

impl MockBlobStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every load with `message`.
    pub fn fail_loads(&self, message: &str) {
        *self.load_failure.lock().unwrap() = Some(Failure {
            scope: FailureScope::All,
            message: message.to_string(),
        });
    }

    /// Fail every save with `message`.
    pub fn fail_saves(&self, message: &str) {
        *self.save_failure.lock().unwrap() = Some(Failure {
            scope: FailureScope::All,
            message: message.to_string(),
        });
    }

    /// Fail saves of keys starting with `prefix`.
    pub fn fail_saves_with_prefix(&self, prefix: &str, message: &str) {
        *self.save_failure.lock().unwrap() = Some(Failure {
            scope: FailureScope::Prefix(prefix.to_string()),
            message: message.to_string(),
        });
    }

    /// Clear injected failures.
    pub fn heal(&self) {
        *self.load_failure.lock().unwrap() = None;
        *self.save_failure.lock().unwrap() = None;
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    /// Whether a record exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.records.lock().unwrap().contains_key(key)
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.records.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn check(slot: &Mutex<Option<Failure>>, key: &str) -> Result<(), StoreError> {
        match slot.lock().unwrap().as_ref() {
            Some(failure) if failure.scope.covers(key) => {
                Err(StoreError::Database(failure.message.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl BlobStore for MockBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Self::check(&self.load_failure, key)?;
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        Self::check(&self.save_failure, key)?;
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}
