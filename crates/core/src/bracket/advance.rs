//! Winner advancement into the next round.
//!
//! The round a match belongs to is recovered from the seed positions of its
//! two occupants: round `r` matches cover aligned blocks of `2^r` seed
//! positions, so the smallest aligned block holding both occupants gives the
//! round. The winner then belongs to the next-round match covering the
//! enclosing block of `2^(r+1)` positions.

use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use super::error::{BracketError, BracketResult};
use super::types::{CategoryBracket, Competitor, Match, MatchPosition, Slot, SlotSide};
use crate::metrics;

/// Outcome of an advancement call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "match", rename_all = "snake_case")]
pub enum Advancement {
    /// Winner filled the awaiting second slot of a next-round match.
    Filled(Match),
    /// Winner opened a next-round match in its first slot.
    Created(Match),
    /// Nothing changed: the winner is already in the next round, or the
    /// source match has nobody to advance. Carries the match found.
    Unchanged(Match),
    /// The source match is the final; there is no next round.
    Decided(Match),
}

impl Advancement {
    /// The resulting next-round match, or the source match for a no-op.
    pub fn into_match(self) -> Match {
        match self {
            Advancement::Filled(m)
            | Advancement::Created(m)
            | Advancement::Unchanged(m)
            | Advancement::Decided(m) => m,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Advancement::Filled(_) => "filled",
            Advancement::Created(_) => "created",
            Advancement::Unchanged(_) => "unchanged",
            Advancement::Decided(_) => "decided",
        }
    }
}

/// Where the winner goes in the next round.
#[derive(Debug, Clone, Copy)]
enum Placement {
    Present(u32),
    FillSecond(u32),
    OpenFirst(u32),
}

/// Winner of a match, `None` when the match has no occupant.
///
/// A sole occupant wins unconditionally (bye). A full match must be finished
/// with unequal scores.
pub fn winner_of(m: &Match) -> BracketResult<Option<&Competitor>> {
    match (&m.first.competitor, &m.second.competitor) {
        (None, None) => Ok(None),
        (Some(only), None) | (None, Some(only)) => Ok(Some(only)),
        (Some(_), Some(_)) => {
            if !m.finished {
                return Err(BracketError::MatchNotFinished(m.position()));
            }
            let (winner, _) = m.decided().ok_or(BracketError::TiedScore {
                position: m.position(),
                score: m.first.score,
            })?;
            Ok(Some(winner))
        }
    }
}

/// Round (1-based) of the smallest aligned block holding both seed positions.
pub fn round_from_seeds(index_a: usize, index_b: usize) -> u32 {
    let mut block = 2usize;
    let mut round = 1;
    while index_a / block != index_b / block {
        block *= 2;
        round += 1;
    }
    round
}

/// Seed-position range covered by the next-round match a round-`round`
/// winner at `min_index` advances into.
pub fn parent_group(round: u32, min_index: usize) -> Range<usize> {
    let child_block = 1usize << round;
    let parent_block = 2 * child_block;
    let start = min_index / parent_block * parent_block;
    start..start + parent_block
}

/// Advance the winner of the match at `position` into the next round.
///
/// Idempotent: advancing the same decided match twice leaves the bracket as
/// the first call left it and returns [`Advancement::Unchanged`].
pub fn advance_winner(
    bracket: &mut CategoryBracket,
    position: MatchPosition,
) -> BracketResult<Advancement> {
    let source = bracket
        .match_at(position)
        .ok_or(BracketError::MatchNotFound(position))?;

    if bracket.seeds.is_empty() {
        return Ok(counted(Advancement::Unchanged(source.clone())));
    }

    let Some(winner) = winner_of(source)?.cloned() else {
        debug!(category = %bracket.key, %position, "Nothing to advance");
        return Ok(counted(Advancement::Unchanged(source.clone())));
    };

    let index_of = |competitor: Option<&Competitor>| -> BracketResult<usize> {
        bracket
            .seeds
            .position(competitor.map_or(winner.id, |c| c.id))
    };
    let index_a = index_of(source.first.competitor.as_ref())?;
    let index_b = index_of(source.second.competitor.as_ref())?;

    let round = if index_a == index_b {
        source.round
    } else {
        let computed = round_from_seeds(index_a, index_b);
        if computed != source.round {
            return Err(BracketError::RoundMismatch {
                position,
                recorded: source.round,
                computed,
            });
        }
        computed
    };

    if round >= bracket.rounds_count() {
        debug!(category = %bracket.key, %position, winner = %winner.name, "Final decided");
        return Ok(counted(Advancement::Decided(source.clone())));
    }

    let group = parent_group(round, index_a.min(index_b));
    let next_round = round + 1;
    let placement = place_in_next_round(bracket, next_round, &winner, &group)?;

    let outcome = match placement {
        Placement::Present(order) => {
            let existing = bracket
                .match_at(MatchPosition::new(next_round, order))
                .ok_or(BracketError::MatchNotFound(MatchPosition::new(next_round, order)))?;
            Advancement::Unchanged(existing.clone())
        }
        Placement::FillSecond(order) => {
            let target = MatchPosition::new(next_round, order);
            let m = bracket
                .match_at_mut(target)
                .ok_or(BracketError::MatchNotFound(target))?;
            *m.slot_mut(SlotSide::Second) = Slot::occupied(winner.clone());
            Advancement::Filled(m.clone())
        }
        Placement::OpenFirst(order) => {
            let target = MatchPosition::new(next_round, order);
            let m = bracket
                .match_at_mut(target)
                .ok_or(BracketError::MatchNotFound(target))?;
            *m.slot_mut(SlotSide::First) = Slot::occupied(winner.clone());
            Advancement::Created(m.clone())
        }
    };

    debug!(
        category = %bracket.key,
        %position,
        winner = %winner.name,
        group_start = group.start,
        group_end = group.end,
        outcome = outcome.label(),
        "Winner advanced"
    );
    Ok(counted(outcome))
}

fn counted(outcome: Advancement) -> Advancement {
    metrics::ADVANCEMENTS
        .with_label_values(&[outcome.label()])
        .inc();
    outcome
}

fn place_in_next_round(
    bracket: &CategoryBracket,
    next_round: u32,
    winner: &Competitor,
    group: &Range<usize>,
) -> BracketResult<Placement> {
    let next = bracket
        .round(next_round)
        .ok_or(BracketError::NoNextRound {
            round: next_round - 1,
        })?;

    if let Some(m) = next.matches.iter().find(|m| m.side_of(winner.id).is_some()) {
        return Ok(Placement::Present(m.order));
    }

    let awaiting = next.matches.iter().find(|m| {
        m.second.is_empty()
            && m.first
                .competitor_id()
                .and_then(|id| bracket.seeds.position(id).ok())
                .is_some_and(|index| group.contains(&index))
    });
    if let Some(m) = awaiting {
        return Ok(Placement::FillSecond(m.order));
    }

    let target_order = (group.start / group.len()) as u32 + 1;
    let no_slot = BracketError::NoAvailableSlot {
        round: next_round,
        competitor: winner.id,
    };
    let target = next
        .matches
        .iter()
        .find(|m| m.order == target_order)
        .ok_or(no_slot)?;

    if target.first.is_empty() {
        Ok(Placement::OpenFirst(target_order))
    } else if target.second.is_empty() {
        Ok(Placement::FillSecond(target_order))
    } else {
        Err(BracketError::NoAvailableSlot {
            round: next_round,
            competitor: winner.id,
        })
    }
}
