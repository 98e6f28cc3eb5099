//! Testing utilities and mock implementations.
//!
//! This module provides an in-memory [`BlobStore`](crate::store::BlobStore)
//! with injectable failures, plus fixtures for seeds and registrations.
//!
//! # Example
//!
//! ```rust,ignore
//! use bracket_core::testing::{fixtures, MockBlobStore};
//!
//! let store = Arc::new(MockBlobStore::new());
//! let editor = CategoryEditor::open(
//!     store.clone(),
//!     fixtures::category_key(),
//!     fixtures::registrations(&["A", "B", "C"]),
//!     fixtures::open_window(),
//!     BracketConfig::default(),
//! )?;
//! ```

mod mock_blob_store;

pub use mock_blob_store::MockBlobStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::bracket::{CategoryKey, Competitor, Registration, SeedList, TournamentWindow};

    /// Category used by most tests.
    pub fn category_key() -> CategoryKey {
        CategoryKey::new(1, 1)
    }

    /// Competitors named after `names`, ids starting at 1.
    pub fn competitors(names: &[&str]) -> Vec<Competitor> {
        names
            .iter()
            .zip(1..)
            .map(|(name, id)| Competitor::new(id, *name))
            .collect()
    }

    /// Seed list in the order of `names`.
    pub fn seeds(names: &[&str]) -> SeedList {
        SeedList::new(competitors(names))
    }

    /// Registrations one minute apart, in the order of `names`.
    pub fn registrations(names: &[&str]) -> Vec<Registration> {
        let base = registration_epoch();
        competitors(names)
            .into_iter()
            .enumerate()
            .map(|(i, c)| Registration {
                competitor_id: c.id,
                name: c.name,
                registered_at: base + Duration::minutes(i as i64),
            })
            .collect()
    }

    fn registration_epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    /// Window that contains the current time.
    pub fn open_window() -> TournamentWindow {
        let now = Utc::now();
        TournamentWindow::new(now - Duration::hours(1), now + Duration::hours(1))
    }

    /// Window that ended yesterday.
    pub fn closed_window() -> TournamentWindow {
        let now = Utc::now();
        TournamentWindow::new(now - Duration::days(2), now - Duration::days(1))
    }
}
