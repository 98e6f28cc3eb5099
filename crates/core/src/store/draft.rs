//! Best-effort persistence of in-progress bracket edits.
//!
//! Two records per category: the category-level draft (finished flag and
//! podium) and the per-match draft (occupants, scores and flags keyed by
//! round and order). Drafts are restored by `(round, order)` because unsaved
//! placeholder matches have no id.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::traits::keys;
use super::{BlobStore, StoreError};
use crate::bracket::{
    CategoryBracket, CategoryKey, Competitor, CompetitorId, Match, MatchKind, MatchPosition,
    Podium, Slot,
};
use crate::metrics;

/// Category-level draft record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podium: Option<Podium>,
}

/// Draft form of a slot. An empty slot is competitor `0` with an empty name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDraft {
    pub competitor_id: CompetitorId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub moved: bool,
}

impl From<&Slot> for SlotDraft {
    fn from(slot: &Slot) -> Self {
        let (competitor_id, name) = match &slot.competitor {
            Some(c) => (c.id, c.name.clone()),
            None => (0, String::new()),
        };
        Self {
            competitor_id,
            name,
            score: slot.score,
            moved: slot.moved,
        }
    }
}

impl SlotDraft {
    pub fn into_slot(self) -> Slot {
        Slot {
            competitor: (self.competitor_id != 0)
                .then(|| Competitor::new(self.competitor_id, self.name)),
            score: self.score,
            moved: self.moved,
        }
    }
}

/// Draft form of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDraft {
    #[serde(default)]
    pub kind: MatchKind,
    pub round: u32,
    pub order: u32,
    pub first: SlotDraft,
    pub second: SlotDraft,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub finished: bool,
}

impl From<&Match> for MatchDraft {
    fn from(m: &Match) -> Self {
        Self {
            kind: m.kind,
            round: m.round,
            order: m.order,
            first: SlotDraft::from(&m.first),
            second: SlotDraft::from(&m.second),
            started: m.started,
            finished: m.finished,
        }
    }
}

impl MatchDraft {
    fn apply_to(self, m: &mut Match) {
        m.first = self.first.into_slot();
        m.second = self.second.into_slot();
        m.started = self.started;
        m.finished = self.finished;
    }
}

/// Draft persistence for category brackets.
#[derive(Clone)]
pub struct BracketStateStore {
    store: Arc<dyn BlobStore>,
}

impl BracketStateStore {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Persist the draft of `bracket`, logging instead of failing.
    pub fn save_draft(&self, bracket: &CategoryBracket) {
        match self.try_save_draft(bracket) {
            Ok(()) => {
                metrics::DRAFT_SAVES.with_label_values(&["ok"]).inc();
                debug!(category = %bracket.key, "Draft saved");
            }
            Err(e) => {
                metrics::DRAFT_SAVES.with_label_values(&["failed"]).inc();
                warn!(category = %bracket.key, error = %e, "Failed to save draft");
            }
        }
    }

    /// Persist the draft of `bracket`.
    pub fn try_save_draft(&self, bracket: &CategoryBracket) -> Result<(), StoreError> {
        let category = CategoryDraft {
            finished: bracket.finished,
            podium: bracket.podium.clone(),
        };
        let matches: Vec<MatchDraft> = bracket.all_matches().map(MatchDraft::from).collect();

        let category_json = serde_json::to_vec(&category)?;
        let matches_json = serde_json::to_vec(&matches)?;

        self.store
            .save(&keys::category_draft(bracket.key), &category_json)?;
        self.store
            .save(&keys::matches_draft(bracket.key), &matches_json)?;
        Ok(())
    }

    /// Apply any stored draft to a freshly built bracket.
    ///
    /// Both records are decoded before either is applied; a read or decode
    /// failure leaves the bracket untouched. Returns whether a draft was
    /// applied.
    pub fn restore_draft(&self, bracket: &mut CategoryBracket) -> bool {
        let (category, matches) = match self.load_drafts(bracket.key) {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!(category = %bracket.key, error = %e, "Ignoring unreadable draft");
                return false;
            }
        };

        if category.is_none() && matches.is_none() {
            return false;
        }

        let applied = matches
            .map(|drafts| apply_match_drafts(bracket, drafts))
            .unwrap_or(0);
        if let Some(category) = category {
            bracket.finished = category.finished;
            bracket.podium = category.podium;
        }

        debug!(category = %bracket.key, matches = applied, "Draft restored");
        true
    }

    fn load_drafts(
        &self,
        key: CategoryKey,
    ) -> Result<(Option<CategoryDraft>, Option<Vec<MatchDraft>>), StoreError> {
        let category = self
            .store
            .load(&keys::category_draft(key))?
            .map(|bytes| serde_json::from_slice::<CategoryDraft>(&bytes))
            .transpose()?;
        let matches = self
            .store
            .load(&keys::matches_draft(key))?
            .map(|bytes| serde_json::from_slice::<Vec<MatchDraft>>(&bytes))
            .transpose()?;
        Ok((category, matches))
    }
}

/// Overlay match drafts onto `bracket`, returning how many were applied.
///
/// Drafts whose position no longer exists in the bracket are skipped.
pub fn apply_match_drafts(bracket: &mut CategoryBracket, drafts: Vec<MatchDraft>) -> usize {
    let mut applied = 0;
    for draft in drafts {
        match draft.kind {
            MatchKind::Bracket => {
                let position = MatchPosition::new(draft.round, draft.order);
                if let Some(m) = bracket.match_at_mut(position) {
                    draft.apply_to(m);
                    applied += 1;
                }
            }
            MatchKind::ThirdPlace => {
                let m = bracket.third_place.get_or_insert_with(|| {
                    let mut bout = Match::placeholder(draft.round, draft.order);
                    bout.kind = MatchKind::ThirdPlace;
                    bout
                });
                draft.apply_to(m);
                applied += 1;
            }
        }
    }
    applied
}
