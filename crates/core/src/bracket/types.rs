//! Core bracket data types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Competitor-in-category identity, owned by the registration subsystem.
pub type CompetitorId = i64;

/// Surrogate match identity. `0` means the match has never been committed.
pub type MatchId = i64;

pub type TournamentId = i64;

pub type CategoryId = i64;

/// Identifier of an unsaved match.
pub const UNSAVED_MATCH_ID: MatchId = 0;

// ============================================================================
// Keys and registrations
// ============================================================================

/// Key of one tournament category; every persisted record hangs off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryKey {
    pub tournament_id: TournamentId,
    pub category_id: CategoryId,
}

impl CategoryKey {
    pub fn new(tournament_id: TournamentId, category_id: CategoryId) -> Self {
        Self {
            tournament_id,
            category_id,
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tournament_id, self.category_id)
    }
}

/// A competitor registered in a category, as handed over by registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub competitor_id: CompetitorId,
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

/// The time window during which a tournament's brackets may be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl TournamentWindow {
    pub fn new(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self { starts_at, ends_at }
    }

    /// Whether `now` falls inside the window (both ends inclusive).
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }
}

// ============================================================================
// Slots and matches
// ============================================================================

/// A competitor as displayed in the bracket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
}

impl Competitor {
    pub fn new(id: CompetitorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One side of a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Occupant, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor: Option<Competitor>,
    pub score: u32,
    /// Set when the occupant was manually moved forward out of this slot.
    #[serde(default)]
    pub moved: bool,
}

impl Slot {
    pub fn occupied(competitor: Competitor) -> Self {
        Self {
            competitor: Some(competitor),
            score: 0,
            moved: false,
        }
    }

    pub fn from_option(competitor: Option<Competitor>) -> Self {
        Self {
            competitor,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.competitor.is_none()
    }

    pub fn competitor_id(&self) -> Option<CompetitorId> {
        self.competitor.as_ref().map(|c| c.id)
    }

    pub fn holds(&self, id: CompetitorId) -> bool {
        self.competitor_id() == Some(id)
    }
}

/// Which slot of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSide {
    First,
    Second,
}

impl SlotSide {
    pub fn other(self) -> Self {
        match self {
            SlotSide::First => SlotSide::Second,
            SlotSide::Second => SlotSide::First,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            SlotSide::First => 1,
            SlotSide::Second => 2,
        }
    }
}

impl TryFrom<u8> for SlotSide {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SlotSide::First),
            2 => Ok(SlotSide::Second),
            other => Err(other),
        }
    }
}

impl fmt::Display for SlotSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Position of a match inside the bracket tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchPosition {
    /// 1-based round number.
    pub round: u32,
    /// 1-based position within the round, left to right.
    pub order: u32,
}

impl MatchPosition {
    pub fn new(round: u32, order: u32) -> Self {
        Self { round, order }
    }
}

impl fmt::Display for MatchPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}M{}", self.round, self.order)
    }
}

/// A single slot of a single match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    pub position: MatchPosition,
    pub side: SlotSide,
}

impl SlotRef {
    pub fn new(position: MatchPosition, side: SlotSide) -> Self {
        Self { position, side }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}S{}", self.position, self.side)
    }
}

/// Marker distinguishing tree matches from the out-of-tree bronze bout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    #[default]
    Bracket,
    ThirdPlace,
}

/// One bout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    #[serde(default)]
    pub kind: MatchKind,
    pub round: u32,
    pub order: u32,
    pub first: Slot,
    pub second: Slot,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub finished: bool,
}

impl Match {
    /// An unsaved match with both slots empty.
    pub fn placeholder(round: u32, order: u32) -> Self {
        Self::pairing(round, order, None, None)
    }

    /// An unsaved match seeded with the given occupants.
    pub fn pairing(
        round: u32,
        order: u32,
        first: Option<Competitor>,
        second: Option<Competitor>,
    ) -> Self {
        Self {
            id: UNSAVED_MATCH_ID,
            kind: MatchKind::Bracket,
            round,
            order,
            first: Slot::from_option(first),
            second: Slot::from_option(second),
            started: false,
            finished: false,
        }
    }

    pub fn position(&self) -> MatchPosition {
        MatchPosition::new(self.round, self.order)
    }

    pub fn is_saved(&self) -> bool {
        self.id != UNSAVED_MATCH_ID
    }

    pub fn slot(&self, side: SlotSide) -> &Slot {
        match side {
            SlotSide::First => &self.first,
            SlotSide::Second => &self.second,
        }
    }

    pub fn slot_mut(&mut self, side: SlotSide) -> &mut Slot {
        match side {
            SlotSide::First => &mut self.first,
            SlotSide::Second => &mut self.second,
        }
    }

    pub fn is_full(&self) -> bool {
        !self.first.is_empty() && !self.second.is_empty()
    }

    pub fn has_occupant(&self) -> bool {
        !self.first.is_empty() || !self.second.is_empty()
    }

    /// The side currently holding `id`, if any.
    pub fn side_of(&self, id: CompetitorId) -> Option<SlotSide> {
        if self.first.holds(id) {
            Some(SlotSide::First)
        } else if self.second.holds(id) {
            Some(SlotSide::Second)
        } else {
            None
        }
    }

    /// Winner and loser of a full match, `None` when the scores are level.
    pub fn decided(&self) -> Option<(&Competitor, &Competitor)> {
        let first = self.first.competitor.as_ref()?;
        let second = self.second.competitor.as_ref()?;
        if self.first.score > self.second.score {
            Some((first, second))
        } else if self.second.score > self.first.score {
            Some((second, first))
        } else {
            None
        }
    }
}

/// All matches of one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRound {
    pub number: u32,
    pub matches: Vec<Match>,
}

/// Final placement of a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podium {
    pub gold: String,
    pub silver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bronze: Option<String>,
}

// ============================================================================
// Category aggregate
// ============================================================================

/// Bracket of one tournament category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBracket {
    pub key: CategoryKey,
    pub seeds: super::SeedList,
    pub rounds: Vec<BracketRound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_place: Option<Match>,
    pub finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podium: Option<Podium>,
}

impl CategoryBracket {
    /// Number of rounds in the tree.
    pub fn rounds_count(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// Number of first-round positions, a power of two.
    pub fn bracket_size(&self) -> usize {
        self.seeds.len().max(1).next_power_of_two()
    }

    pub fn round(&self, number: u32) -> Option<&BracketRound> {
        let index = number.checked_sub(1)? as usize;
        self.rounds.get(index)
    }

    pub fn round_mut(&mut self, number: u32) -> Option<&mut BracketRound> {
        let index = number.checked_sub(1)? as usize;
        self.rounds.get_mut(index)
    }

    pub fn match_at(&self, position: MatchPosition) -> Option<&Match> {
        self.round(position.round)?
            .matches
            .iter()
            .find(|m| m.order == position.order)
    }

    pub fn match_at_mut(&mut self, position: MatchPosition) -> Option<&mut Match> {
        self.round_mut(position.round)?
            .matches
            .iter_mut()
            .find(|m| m.order == position.order)
    }

    /// The last match of the last round.
    pub fn final_match(&self) -> Option<&Match> {
        self.rounds.last()?.matches.last()
    }

    /// Every match, tree rounds first, then the third-place bout.
    pub fn all_matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .chain(self.third_place.iter())
    }

    pub fn all_matches_mut(&mut self) -> impl Iterator<Item = &mut Match> {
        self.rounds
            .iter_mut()
            .flat_map(|r| r.matches.iter_mut())
            .chain(self.third_place.iter_mut())
    }
}
