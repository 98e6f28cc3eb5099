//! Single-elimination bracket engine.
//!
//! The engine is a set of synchronous transformations over one
//! [`CategoryBracket`]:
//! - [`build_bracket`] materializes the round structure from a [`SeedList`]
//! - [`advance_winner`] moves a decided match's winner into the next round
//! - [`move_right`] / [`move_left`] relocate a competitor by hand
//! - [`calculate_podium`] derives gold/silver/bronze
//!
//! Failing calls leave the bracket untouched.

mod advance;
mod builder;
mod error;
mod mover;
mod podium;
mod seed;
mod types;

pub use advance::{advance_winner, parent_group, round_from_seeds, winner_of, Advancement};
pub use builder::{bracket_size_for, build_bracket, rounds_for};
pub use error::{BracketError, BracketResult};
pub use mover::{move_left, move_right};
pub use podium::{calculate_podium, create_third_place_match, THIRD_PLACE_ORDER};
pub use seed::{seed_position, SeedList};
pub use types::{
    BracketRound, CategoryBracket, CategoryId, CategoryKey, Competitor, CompetitorId, Match,
    MatchId, MatchKind, MatchPosition, Podium, Registration, Slot, SlotRef, SlotSide,
    TournamentId, TournamentWindow, UNSAVED_MATCH_ID,
};
