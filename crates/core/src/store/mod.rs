//! Persistence of brackets: a keyed blob store plus the committed and draft
//! records layered on top of it.

mod draft;
mod repository;
mod sqlite;
mod traits;

pub use draft::{apply_match_drafts, BracketStateStore, CategoryDraft, MatchDraft, SlotDraft};
pub use repository::{BracketRepository, CommittedCategory};
pub use sqlite::SqliteBlobStore;
pub use traits::{keys, BlobStore, StoreError};
