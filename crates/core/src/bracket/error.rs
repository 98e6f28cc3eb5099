//! Error types for bracket operations.

use thiserror::Error;

use super::types::{CategoryKey, CompetitorId, MatchPosition, SlotRef};
use crate::store::StoreError;

/// Errors that can occur while building, advancing, moving or finalizing.
///
/// Every variant except [`BracketError::Persistence`] is a logic error: the
/// bracket is left exactly as it was before the failing call.
#[derive(Debug, Error)]
pub enum BracketError {
    /// Competitor is not part of the category's seed list.
    #[error("Competitor {competitor} is not seeded in this category")]
    NotSeeded { competitor: CompetitorId },

    /// No match exists at the requested position.
    #[error("Match not found: {0}")]
    MatchNotFound(MatchPosition),

    /// Both slots are occupied but the match has not been marked finished.
    #[error("Match {0} is not finished")]
    MatchNotFinished(MatchPosition),

    /// Advancement or finalization attempted on a level match.
    #[error("Match {position} is tied at {score}")]
    TiedScore { position: MatchPosition, score: u32 },

    /// The other occupant of this match has already moved forward.
    #[error("Both occupants of match {position} cannot move forward")]
    DualMoveViolation { position: MatchPosition },

    /// The occupant of this slot has already moved forward.
    #[error("Slot {0} has already moved forward")]
    AlreadyMoved(SlotRef),

    /// The addressed slot has no occupant.
    #[error("Slot {0} is empty")]
    EmptySlot(SlotRef),

    /// No slot in the target round can take the competitor.
    #[error("No available slot in round {round} for competitor {competitor}")]
    NoAvailableSlot {
        round: u32,
        competitor: CompetitorId,
    },

    /// Forward move requested from the last round.
    #[error("Round {round} is the last round")]
    NoNextRound { round: u32 },

    /// Backward move requested from the first round.
    #[error("Round {round} has no previous round")]
    NoPreviousRound { round: u32 },

    /// Seed arithmetic and the stored round disagree.
    #[error("Match {position} is stored in round {recorded} but its seeds belong to round {computed}")]
    RoundMismatch {
        position: MatchPosition,
        recorded: u32,
        computed: u32,
    },

    /// Finalization attempted with an empty or partial final.
    #[error("Final match is incomplete")]
    IncompleteFinal,

    /// Third-place bout cannot be formed.
    #[error("Third place match unavailable: {0}")]
    ThirdPlaceUnavailable(&'static str),

    /// Mutation attempted outside the tournament window or after finalization.
    #[error("Category {key} is not editable: {reason}")]
    NotEditable {
        key: CategoryKey,
        reason: &'static str,
    },

    /// Durable commit or draft I/O failed.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

pub type BracketResult<T> = Result<T, BracketError>;

impl BracketError {
    /// Whether the error should be shown to the editor as a rule violation
    /// rather than a system failure.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Persistence(_) | Self::RoundMismatch { .. })
    }
}
