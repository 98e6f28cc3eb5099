//! Manual forward/backward relocation of a competitor between adjacent rounds.

use tracing::debug;

use super::error::{BracketError, BracketResult};
use super::types::{CategoryBracket, CompetitorId, Match, MatchPosition, Slot, SlotRef, SlotSide};

/// Move the occupant of `from` one round forward.
///
/// The occupant stays visible at its origin with `moved` set, which blocks a
/// second forward move from either slot of that match until reversed.
/// Returns the destination slot.
pub fn move_right(bracket: &mut CategoryBracket, from: SlotRef) -> BracketResult<SlotRef> {
    let position = from.position;
    let source = bracket
        .match_at(position)
        .ok_or(BracketError::MatchNotFound(position))?;
    let origin = source.slot(from.side);
    let competitor = origin
        .competitor
        .clone()
        .ok_or(BracketError::EmptySlot(from))?;

    if origin.moved {
        return Err(BracketError::AlreadyMoved(from));
    }
    if source.slot(from.side.other()).moved {
        return Err(BracketError::DualMoveViolation { position });
    }
    if position.round >= bracket.rounds_count() {
        return Err(BracketError::NoNextRound {
            round: position.round,
        });
    }

    let next_round = position.round + 1;
    let next = bracket
        .round(next_round)
        .ok_or(BracketError::NoNextRound {
            round: position.round,
        })?;
    let target_index = (position.order as usize)
        .div_ceil(2)
        .min(next.matches.len())
        .max(1)
        - 1;
    let destination = pick_slot(&next.matches, target_index, competitor.id).ok_or(
        BracketError::NoAvailableSlot {
            round: next_round,
            competitor: competitor.id,
        },
    )?;

    if let Some(m) = bracket.match_at_mut(destination.position) {
        let slot = m.slot_mut(destination.side);
        if !slot.holds(competitor.id) {
            *slot = Slot::occupied(competitor.clone());
        }
    }
    if let Some(m) = bracket.match_at_mut(position) {
        m.slot_mut(from.side).moved = true;
    }

    debug!(
        category = %bracket.key,
        competitor = %competitor.name,
        from = %from,
        to = %destination,
        "Moved competitor forward"
    );
    Ok(destination)
}

/// Reverse a previous forward move of the occupant of `at`.
///
/// Clears the occupant from `at` and the `moved` flag at its origin in the
/// previous round. Returns the origin slot, or `None` when the occupant has
/// no origin in the previous round (nothing is changed then).
pub fn move_left(bracket: &mut CategoryBracket, at: SlotRef) -> BracketResult<Option<SlotRef>> {
    let position = at.position;
    if position.round <= 1 {
        return Err(BracketError::NoPreviousRound {
            round: position.round,
        });
    }

    let current = bracket
        .match_at(position)
        .ok_or(BracketError::MatchNotFound(position))?;
    let competitor_id = current
        .slot(at.side)
        .competitor_id()
        .ok_or(BracketError::EmptySlot(at))?;

    let Some(origin) = find_origin(bracket, position.round - 1, competitor_id) else {
        debug!(
            category = %bracket.key,
            competitor = competitor_id,
            at = %at,
            "No origin in previous round, move left ignored"
        );
        return Ok(None);
    };

    if let Some(m) = bracket.match_at_mut(origin.position) {
        m.slot_mut(origin.side).moved = false;
    }
    if let Some(m) = bracket.match_at_mut(position) {
        *m.slot_mut(at.side) = Slot::default();
    }

    debug!(
        category = %bracket.key,
        competitor = competitor_id,
        from = %at,
        to = %origin,
        "Moved competitor back"
    );
    Ok(Some(origin))
}

/// Destination for `id` in the next round: the target match first, then the
/// first match of the round with a free or matching slot.
fn pick_slot(matches: &[Match], target_index: usize, id: CompetitorId) -> Option<SlotRef> {
    let accepting = |m: &Match| -> Option<SlotRef> {
        let side = m.side_of(id).or_else(|| {
            [SlotSide::First, SlotSide::Second]
                .into_iter()
                .find(|side| m.slot(*side).is_empty())
        })?;
        Some(SlotRef::new(m.position(), side))
    };

    matches
        .get(target_index)
        .and_then(&accepting)
        .or_else(|| {
            matches
                .iter()
                .find_map(|m| m.side_of(id).map(|side| SlotRef::new(m.position(), side)))
        })
        .or_else(|| matches.iter().find_map(&accepting))
}

/// Slot in `round` holding `id`, preferring one flagged as moved.
fn find_origin(bracket: &CategoryBracket, round: u32, id: CompetitorId) -> Option<SlotRef> {
    let matches = &bracket.round(round)?.matches;
    let holding = || {
        matches.iter().flat_map(|m| {
            [SlotSide::First, SlotSide::Second]
                .into_iter()
                .filter(move |side| m.slot(*side).holds(id))
                .map(move |side| (m, side))
        })
    };

    holding()
        .find(|(m, side)| m.slot(*side).moved)
        .or_else(|| holding().next())
        .map(|(m, side)| SlotRef::new(MatchPosition::new(m.round, m.order), side))
}
