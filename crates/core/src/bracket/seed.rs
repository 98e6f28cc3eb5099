//! Seed list and seed-position lookup.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::{BracketError, BracketResult};
use super::types::{Competitor, CompetitorId, Registration};

/// Registration-ordered competitors of one category.
///
/// Ids are unique and never `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedList {
    entries: Vec<Competitor>,
}

impl SeedList {
    /// Build from competitors already in registration order.
    pub fn new(competitors: impl IntoIterator<Item = Competitor>) -> Self {
        let mut seen = HashSet::new();
        let entries = competitors
            .into_iter()
            .filter(|c| c.id != 0 && seen.insert(c.id))
            .collect();
        Self { entries }
    }

    /// Build from registrations, ordered by registration time with the
    /// competitor id as tiebreak.
    pub fn from_registrations(mut registrations: Vec<Registration>) -> Self {
        registrations.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then(a.competitor_id.cmp(&b.competitor_id))
        });
        Self::new(
            registrations
                .into_iter()
                .map(|r| Competitor::new(r.competitor_id, r.name)),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Competitor> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Competitor> {
        self.entries.iter()
    }

    /// 0-based seed position of `competitor`.
    pub fn position(&self, competitor: CompetitorId) -> BracketResult<usize> {
        seed_position(self, competitor)
    }
}

/// 0-based index of `competitor` within `seeds`.
pub fn seed_position(seeds: &SeedList, competitor: CompetitorId) -> BracketResult<usize> {
    seeds
        .entries
        .iter()
        .position(|c| c.id == competitor)
        .ok_or(BracketError::NotSeeded { competitor })
}
