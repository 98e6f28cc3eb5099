//! Podium derivation from the final and the third-place bout.

use tracing::debug;

use super::error::{BracketError, BracketResult};
use super::types::{CategoryBracket, Competitor, Match, MatchKind, Podium};

/// Order given to the third-place bout inside the final round.
pub const THIRD_PLACE_ORDER: u32 = 2;

/// Compute gold, silver and (optionally) bronze.
///
/// Gold and silver come from the last round holding any full match, taking
/// its last match with an occupied second slot. Bronze comes from the
/// third-place bout when that bout is full.
pub fn calculate_podium(bracket: &CategoryBracket) -> BracketResult<Podium> {
    let deciding_round = bracket
        .rounds
        .iter()
        .rev()
        .find(|round| round.matches.iter().any(Match::is_full))
        .ok_or(BracketError::IncompleteFinal)?;

    let deciding = deciding_round
        .matches
        .iter()
        .rev()
        .find(|m| m.is_full())
        .ok_or(BracketError::IncompleteFinal)?;

    let (gold, silver) = deciding.decided().ok_or(BracketError::TiedScore {
        position: deciding.position(),
        score: deciding.first.score,
    })?;

    let bronze = match bracket.third_place.as_ref().filter(|m| m.is_full()) {
        Some(bout) => {
            let (winner, _) = bout.decided().ok_or(BracketError::TiedScore {
                position: bout.position(),
                score: bout.first.score,
            })?;
            Some(winner.name.clone())
        }
        None => None,
    };

    Ok(Podium {
        gold: gold.name.clone(),
        silver: silver.name.clone(),
        bronze,
    })
}

/// Pair the two semifinal losers in the out-of-tree bronze bout.
///
/// Returns the existing bout unchanged when it already holds the same pairing.
pub fn create_third_place_match(bracket: &mut CategoryBracket) -> BracketResult<Match> {
    let rounds = bracket.rounds_count();
    if rounds < 2 {
        return Err(BracketError::ThirdPlaceUnavailable("bracket has no semifinals"));
    }

    let losers: Vec<Competitor> = bracket
        .round(rounds - 1)
        .map(|semis| {
            semis
                .matches
                .iter()
                .filter(|m| m.finished)
                .filter_map(|m| m.decided().map(|(_, loser)| loser.clone()))
                .collect()
        })
        .unwrap_or_default();

    let [first, second]: [Competitor; 2] = losers
        .try_into()
        .map_err(|_| BracketError::ThirdPlaceUnavailable("both semifinals must be decided"))?;

    if let Some(existing) = &bracket.third_place {
        if existing.first.holds(first.id) && existing.second.holds(second.id) {
            return Ok(existing.clone());
        }
    }

    let mut bout = Match::pairing(rounds, THIRD_PLACE_ORDER, Some(first), Some(second));
    bout.kind = MatchKind::ThirdPlace;
    if let Some(existing) = &bracket.third_place {
        bout.id = existing.id;
    }
    debug!(category = %bracket.key, "Third place match created");
    bracket.third_place = Some(bout.clone());
    Ok(bout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::builder::build_bracket;
    use crate::bracket::seed::SeedList;
    use crate::bracket::types::{CategoryKey, MatchPosition, Slot};

    fn four_player_bracket() -> CategoryBracket {
        let seeds = SeedList::new(vec![
            Competitor::new(1, "A"),
            Competitor::new(2, "B"),
            Competitor::new(3, "C"),
            Competitor::new(4, "D"),
        ]);
        build_bracket(CategoryKey::new(1, 1), seeds, vec![])
    }

    fn fill_final(bracket: &mut CategoryBracket, first: u32, second: u32) {
        let m = bracket.match_at_mut(MatchPosition::new(2, 1)).unwrap();
        m.first = Slot::occupied(Competitor::new(1, "A"));
        m.second = Slot::occupied(Competitor::new(3, "C"));
        m.first.score = first;
        m.second.score = second;
    }

    #[test]
    fn test_final_decides_gold_and_silver() {
        let mut bracket = four_player_bracket();
        fill_final(&mut bracket, 4, 6);

        let podium = calculate_podium(&bracket).unwrap();
        assert_eq!(podium.gold, "C");
        assert_eq!(podium.silver, "A");
        assert!(podium.bronze.is_none());
    }

    #[test]
    fn test_tied_final_is_an_error() {
        let mut bracket = four_player_bracket();
        fill_final(&mut bracket, 5, 5);

        let err = calculate_podium(&bracket).unwrap_err();
        assert!(matches!(err, BracketError::TiedScore { score: 5, .. }));
    }

    #[test]
    fn test_falls_back_to_last_full_round() {
        let mut bracket = four_player_bracket();
        let semi = bracket.match_at_mut(MatchPosition::new(1, 2)).unwrap();
        semi.first.score = 1;
        semi.second.score = 0;

        let podium = calculate_podium(&bracket).unwrap();
        assert_eq!(podium.gold, "C");
        assert_eq!(podium.silver, "D");
    }

    #[test]
    fn test_no_full_match_is_incomplete() {
        let bracket = build_bracket(
            CategoryKey::new(1, 1),
            SeedList::new(vec![Competitor::new(1, "Solo")]),
            vec![],
        );
        assert!(matches!(
            calculate_podium(&bracket),
            Err(BracketError::IncompleteFinal)
        ));
    }

    #[test]
    fn test_third_place_bout_awards_bronze() {
        let mut bracket = four_player_bracket();
        fill_final(&mut bracket, 3, 1);
        let mut bout = Match::pairing(
            2,
            2,
            Some(Competitor::new(2, "B")),
            Some(Competitor::new(4, "D")),
        );
        bout.kind = MatchKind::ThirdPlace;
        bout.first.score = 0;
        bout.second.score = 2;
        bracket.third_place = Some(bout);

        let podium = calculate_podium(&bracket).unwrap();
        assert_eq!(podium.gold, "A");
        assert_eq!(podium.bronze.as_deref(), Some("D"));
    }

    #[test]
    fn test_half_filled_third_place_gives_no_bronze() {
        let mut bracket = four_player_bracket();
        fill_final(&mut bracket, 3, 1);
        let mut bout = Match::pairing(2, 2, Some(Competitor::new(2, "B")), None);
        bout.kind = MatchKind::ThirdPlace;
        bracket.third_place = Some(bout);

        assert!(calculate_podium(&bracket).unwrap().bronze.is_none());
    }

    #[test]
    fn test_third_place_pairs_semifinal_losers() {
        let mut bracket = four_player_bracket();
        for (order, first, second) in [(1, 3, 1), (2, 0, 2)] {
            let m = bracket.match_at_mut(MatchPosition::new(1, order)).unwrap();
            m.first.score = first;
            m.second.score = second;
            m.finished = true;
        }

        let bout = create_third_place_match(&mut bracket).unwrap();
        assert_eq!(bout.kind, MatchKind::ThirdPlace);
        assert_eq!(bout.first.competitor_id(), Some(2));
        assert_eq!(bout.second.competitor_id(), Some(3));
        assert_eq!(bout.order, THIRD_PLACE_ORDER);

        let mut scored = bracket.clone();
        scored.third_place.as_mut().unwrap().first.score = 4;
        let again = create_third_place_match(&mut scored).unwrap();
        assert_eq!(again.first.score, 4);
    }

    #[test]
    fn test_third_place_needs_decided_semifinals() {
        let mut bracket = four_player_bracket();
        let err = create_third_place_match(&mut bracket).unwrap_err();
        assert!(matches!(err, BracketError::ThirdPlaceUnavailable(_)));
        assert!(bracket.third_place.is_none());
    }
}
