//! Keyed blob storage trait and error type.

use thiserror::Error;

use crate::bracket::CategoryKey;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Trait for keyed storage of opaque records.
pub trait BlobStore: Send + Sync {
    /// Load the record stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `bytes` under `key`, replacing any previous record.
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Record keys used by the engine.
pub mod keys {
    use super::CategoryKey;

    /// Committed matches, finished flag and podium of a category.
    pub fn committed(key: CategoryKey) -> String {
        format!("bracket:{}:{}", key.tournament_id, key.category_id)
    }

    /// Last allocated match id.
    pub const MATCH_SEQUENCE: &str = "bracket:sequence:match";

    /// Category-level draft.
    pub fn category_draft(key: CategoryKey) -> String {
        format!("draft:{}:{}:category", key.tournament_id, key.category_id)
    }

    /// Per-match draft.
    pub fn matches_draft(key: CategoryKey) -> String {
        format!("draft:{}:{}:matches", key.tournament_id, key.category_id)
    }
}
