//! Bracket construction from a seed list.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::podium::calculate_podium;
use super::seed::SeedList;
use super::types::{BracketRound, CategoryBracket, CategoryKey, Match, MatchKind};
use crate::metrics;

/// Smallest power of two holding `n` competitors (1 for an empty or single entry).
pub fn bracket_size_for(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Number of rounds needed for `bracket_size` first-round positions.
pub fn rounds_for(bracket_size: usize) -> u32 {
    bracket_size.trailing_zeros().max(1)
}

/// Build the full round structure for a category.
///
/// `existing` holds previously committed matches. Committed round-1 rows are
/// used verbatim instead of synthesized pairings; committed rows of later
/// rounds replace the placeholder at the same position; a committed
/// third-place row becomes the bronze bout.
pub fn build_bracket(key: CategoryKey, seeds: SeedList, existing: Vec<Match>) -> CategoryBracket {
    let mut bracket = CategoryBracket {
        key,
        seeds,
        rounds: Vec::new(),
        third_place: None,
        finished: false,
        podium: None,
    };

    let n = bracket.seeds.len();
    if n == 0 {
        debug!(category = %key, "No competitors, bracket left empty");
        return bracket;
    }

    let bracket_size = bracket_size_for(n);
    let rounds_count = rounds_for(bracket_size);

    let mut committed_round_one = Vec::new();
    let mut committed = HashMap::new();
    for m in existing {
        match m.kind {
            MatchKind::ThirdPlace => bracket.third_place = Some(m),
            MatchKind::Bracket if m.round == 1 => committed_round_one.push(m),
            MatchKind::Bracket => {
                committed.insert(m.position(), m);
            }
        }
    }

    let first_round = if committed_round_one.is_empty() {
        synthesize_first_round(&bracket.seeds, bracket_size)
    } else {
        restore_first_round(committed_round_one, bracket_size)
    };
    bracket.rounds.push(BracketRound {
        number: 1,
        matches: first_round,
    });

    for round in 2..=rounds_count {
        let count = (bracket_size >> round) as u32;
        let matches = (1..=count)
            .map(|order| {
                let placeholder = Match::placeholder(round, order);
                committed
                    .remove(&placeholder.position())
                    .unwrap_or(placeholder)
            })
            .collect();
        bracket.rounds.push(BracketRound {
            number: round,
            matches,
        });
    }

    if !committed.is_empty() {
        warn!(
            category = %key,
            dropped = committed.len(),
            "Committed matches fall outside the current bracket shape"
        );
    }

    recover_decided_final(&mut bracket);

    metrics::BRACKETS_BUILT.inc();
    info!(
        category = %key,
        competitors = n,
        bracket_size,
        rounds = rounds_count,
        finished = bracket.finished,
        "Bracket built"
    );
    bracket
}

/// Pair the seed list two at a time; missing entries become byes.
fn synthesize_first_round(seeds: &SeedList, bracket_size: usize) -> Vec<Match> {
    let count = (bracket_size / 2).max(1);
    (0..count)
        .map(|i| {
            Match::pairing(
                1,
                i as u32 + 1,
                seeds.get(2 * i).cloned(),
                seeds.get(2 * i + 1).cloned(),
            )
        })
        .collect()
}

/// Committed round-1 rows in order. Pairings that were never committed (an
/// empty bye/bye) come back as empty placeholders.
fn restore_first_round(mut committed: Vec<Match>, bracket_size: usize) -> Vec<Match> {
    committed.sort_by_key(|m| m.order);
    let expected = (bracket_size / 2).max(1) as u32;
    let count = committed.last().map_or(expected, |m| m.order.max(expected));
    let mut rows = committed.into_iter().peekable();
    (1..=count)
        .map(|order| match rows.next_if(|m| m.order == order) {
            Some(m) => m,
            None => Match::placeholder(1, order),
        })
        .collect()
}

/// Mark a reloaded bracket finished when its committed final is already decided.
fn recover_decided_final(bracket: &mut CategoryBracket) {
    let decided = bracket
        .final_match()
        .is_some_and(|m| m.is_saved() && m.decided().is_some());
    if !decided {
        return;
    }

    match calculate_podium(bracket) {
        Ok(podium) => {
            debug!(category = %bracket.key, gold = %podium.gold, "Recovered decided final");
            bracket.finished = true;
            bracket.podium = Some(podium);
        }
        Err(e) => {
            warn!(category = %bracket.key, error = %e, "Decided final but podium unavailable");
        }
    }
}
