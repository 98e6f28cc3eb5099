//! Committed bracket records.
//!
//! Committing assigns ids to every unsaved match that holds a competitor and
//! writes one record per category: the saved matches together with the
//! finished flag and podium. Ids come from a store-wide sequence so they stay
//! unique across categories.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::traits::keys;
use super::{BlobStore, StoreError};
use crate::bracket::{CategoryBracket, CategoryKey, Match, MatchId, Podium};

/// Committed state of one category, written in a single save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedCategory {
    #[serde(default)]
    pub finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podium: Option<Podium>,
    #[serde(default)]
    pub matches: Vec<Match>,
}

/// Borrowed form of [`CommittedCategory`] used when writing.
#[derive(Serialize)]
struct CommittedCategoryRef<'a> {
    finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    podium: Option<&'a Podium>,
    matches: Vec<&'a Match>,
}

/// Committed persistence for category brackets.
#[derive(Clone)]
pub struct BracketRepository {
    store: Arc<dyn BlobStore>,
}

impl BracketRepository {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Load the committed state of a category. A missing record is empty
    /// and open.
    pub fn load(&self, key: CategoryKey) -> Result<CommittedCategory, StoreError> {
        match self.store.load(&keys::committed(key))? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(CommittedCategory::default()),
        }
    }

    /// Assign ids to unsaved occupied matches, then write every saved match
    /// with the bracket's finished flag and podium as one record.
    ///
    /// The podium is only recorded for a finished bracket. Returns the number
    /// of newly assigned ids. On error the ids already written into `bracket`
    /// must be discarded by the caller.
    pub fn commit_matches(&self, bracket: &mut CategoryBracket) -> Result<usize, StoreError> {
        let pending = bracket
            .all_matches()
            .filter(|m| !m.is_saved() && m.has_occupant())
            .count();

        if pending > 0 {
            let mut next = self.allocate_ids(pending)?;
            for m in bracket
                .all_matches_mut()
                .filter(|m| !m.is_saved() && m.has_occupant())
            {
                m.id = next;
                next += 1;
            }
        }

        let record = CommittedCategoryRef {
            finished: bracket.finished,
            podium: bracket.podium.as_ref().filter(|_| bracket.finished),
            matches: bracket.all_matches().filter(|m| m.is_saved()).collect(),
        };
        let bytes = serde_json::to_vec(&record)?;
        self.store.save(&keys::committed(bracket.key), &bytes)?;

        info!(
            category = %bracket.key,
            matches = record.matches.len(),
            finished = record.finished,
            new_ids = pending,
            "Bracket committed"
        );
        Ok(pending)
    }

    /// Reserve `count` consecutive ids, returning the first.
    fn allocate_ids(&self, count: usize) -> Result<MatchId, StoreError> {
        let last: MatchId = match self.store.load(keys::MATCH_SEQUENCE)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => 0,
        };
        let reserved = last + count as MatchId;
        self.store
            .save(keys::MATCH_SEQUENCE, &serde_json::to_vec(&reserved)?)?;
        debug!(first = last + 1, last = reserved, "Match ids reserved");
        Ok(last + 1)
    }
}
