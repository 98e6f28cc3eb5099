//! Single-editor session over one category bracket.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::bracket::{
    self, calculate_podium, Advancement, BracketError, BracketResult, CategoryBracket,
    CategoryKey, Match, MatchPosition, Podium, Registration, SeedList, SlotRef,
    TournamentWindow,
};
use crate::config::BracketConfig;
use crate::metrics;
use crate::store::{BlobStore, BracketRepository, BracketStateStore};

/// Editing session for one category.
///
/// Owns the in-memory bracket and brackets every mutation with the
/// editability check before and the draft save after. Mutations that touch
/// more than one match run on a scratch copy that replaces the bracket only
/// on success.
pub struct CategoryEditor {
    bracket: CategoryBracket,
    window: TournamentWindow,
    config: BracketConfig,
    repository: BracketRepository,
    drafts: BracketStateStore,
}

impl CategoryEditor {
    /// Load a category: the committed record, then any draft left by a
    /// previous session.
    pub fn open(
        store: Arc<dyn BlobStore>,
        key: CategoryKey,
        registrations: Vec<Registration>,
        window: TournamentWindow,
        config: BracketConfig,
    ) -> BracketResult<Self> {
        let repository = BracketRepository::new(Arc::clone(&store));
        let drafts = BracketStateStore::new(store);

        let seeds = SeedList::from_registrations(registrations);
        let committed = repository.load(key)?;
        let mut bracket = bracket::build_bracket(key, seeds, committed.matches);

        if committed.finished {
            bracket.finished = true;
            if committed.podium.is_some() {
                bracket.podium = committed.podium;
            }
        }

        if config.drafts_enabled && !bracket.finished && drafts.restore_draft(&mut bracket) {
            info!(category = %key, "Resumed from draft");
        }

        Ok(Self {
            bracket,
            window,
            config,
            repository,
            drafts,
        })
    }

    pub fn bracket(&self) -> &CategoryBracket {
        &self.bracket
    }

    pub fn key(&self) -> CategoryKey {
        self.bracket.key
    }

    pub fn window(&self) -> TournamentWindow {
        self.window
    }

    pub fn is_finished(&self) -> bool {
        self.bracket.finished
    }

    /// Whether mutations are accepted right now.
    pub fn is_editable(&self) -> bool {
        self.check_editable(Utc::now()).is_ok()
    }

    fn check_editable(&self, now: DateTime<Utc>) -> BracketResult<()> {
        let reason = if self.bracket.finished {
            "category is finished"
        } else if !self.window.contains(now) {
            "outside tournament window"
        } else {
            return Ok(());
        };
        Err(BracketError::NotEditable {
            key: self.bracket.key,
            reason,
        })
    }

    fn ensure_editable(&self) -> BracketResult<()> {
        self.check_editable(Utc::now())
    }

    fn persist_draft(&self) {
        if self.config.drafts_enabled {
            self.drafts.save_draft(&self.bracket);
        }
    }

    /// Set both scores of a match and mark it started.
    pub fn record_score(
        &mut self,
        position: MatchPosition,
        first: u32,
        second: u32,
    ) -> BracketResult<Match> {
        self.ensure_editable()?;
        let m = self
            .bracket
            .match_at_mut(position)
            .ok_or(BracketError::MatchNotFound(position))?;
        m.first.score = first;
        m.second.score = second;
        m.started = true;
        let recorded = m.clone();

        debug!(category = %self.bracket.key, %position, first, second, "Score recorded");
        self.persist_draft();
        Ok(recorded)
    }

    /// Record final scores, finish the match and advance its winner.
    ///
    /// Nothing changes unless the advancement succeeds.
    pub fn submit_result(
        &mut self,
        position: MatchPosition,
        first: u32,
        second: u32,
    ) -> BracketResult<Advancement> {
        self.ensure_editable()?;
        let mut scratch = self.bracket.clone();
        let m = scratch
            .match_at_mut(position)
            .ok_or(BracketError::MatchNotFound(position))?;
        m.first.score = first;
        m.second.score = second;
        m.started = true;
        m.finished = true;

        let outcome = bracket::advance_winner(&mut scratch, position)?;
        if let Advancement::Decided(_) = outcome {
            scratch.podium = decisive_podium(&scratch);
        }
        self.bracket = scratch;

        self.persist_draft();
        Ok(outcome)
    }

    /// Advance the winner of an already finished match.
    pub fn advance_winner(&mut self, position: MatchPosition) -> BracketResult<Advancement> {
        self.ensure_editable()?;
        let outcome = bracket::advance_winner(&mut self.bracket, position)?;
        if let Advancement::Decided(_) = outcome {
            self.bracket.podium = decisive_podium(&self.bracket);
        }

        self.persist_draft();
        Ok(outcome)
    }

    /// Move the occupant of `from` one round forward.
    pub fn move_right(&mut self, from: SlotRef) -> BracketResult<SlotRef> {
        self.ensure_editable()?;
        match bracket::move_right(&mut self.bracket, from) {
            Ok(to) => {
                metrics::SLOT_MOVES.with_label_values(&["right", "ok"]).inc();
                info!(category = %self.bracket.key, %from, %to, "Competitor moved forward");
                self.persist_draft();
                Ok(to)
            }
            Err(e) => {
                metrics::SLOT_MOVES.with_label_values(&["right", "rejected"]).inc();
                Err(e)
            }
        }
    }

    /// Undo a forward move into `at`.
    pub fn move_left(&mut self, at: SlotRef) -> BracketResult<Option<SlotRef>> {
        self.ensure_editable()?;
        match bracket::move_left(&mut self.bracket, at) {
            Ok(Some(origin)) => {
                metrics::SLOT_MOVES.with_label_values(&["left", "ok"]).inc();
                info!(category = %self.bracket.key, %at, %origin, "Competitor moved back");
                self.persist_draft();
                Ok(Some(origin))
            }
            Ok(None) => {
                metrics::SLOT_MOVES.with_label_values(&["left", "noop"]).inc();
                warn!(category = %self.bracket.key, %at, "No origin found for move back");
                Ok(None)
            }
            Err(e) => {
                metrics::SLOT_MOVES.with_label_values(&["left", "rejected"]).inc();
                Err(e)
            }
        }
    }

    /// Pair the semifinal losers in the bronze bout.
    pub fn create_third_place_match(&mut self) -> BracketResult<Match> {
        self.ensure_editable()?;
        if !self.config.third_place_match {
            return Err(BracketError::ThirdPlaceUnavailable(
                "disabled by configuration",
            ));
        }
        let bout = bracket::create_third_place_match(&mut self.bracket)?;

        self.persist_draft();
        Ok(bout)
    }

    /// Record the bronze bout's scores. The bout has no next round, so it is
    /// marked finished as well.
    pub fn record_third_place_score(&mut self, first: u32, second: u32) -> BracketResult<Match> {
        self.ensure_editable()?;
        let bout = self
            .bracket
            .third_place
            .as_mut()
            .ok_or(BracketError::ThirdPlaceUnavailable("no third place match"))?;
        bout.first.score = first;
        bout.second.score = second;
        bout.started = true;
        bout.finished = true;
        let recorded = bout.clone();

        self.persist_draft();
        Ok(recorded)
    }

    /// Durably commit the current matches without finishing the category.
    ///
    /// Returns the number of matches that received an id.
    pub fn commit(&mut self) -> BracketResult<usize> {
        let mut scratch = self.bracket.clone();
        let assigned = self.repository.commit_matches(&mut scratch)?;
        self.bracket = scratch;
        Ok(assigned)
    }

    /// Close the category: the final must be full and decisive. Every match is
    /// committed together with the finished flag and podium in one write
    /// before the bracket is marked finished.
    pub fn finish_category(&mut self) -> BracketResult<Podium> {
        let result = self.try_finish();
        let label = match &result {
            Ok(_) => "finished",
            Err(BracketError::Persistence(_)) => "failed",
            Err(_) => "rejected",
        };
        metrics::CATEGORIES_FINISHED.with_label_values(&[label]).inc();
        result
    }

    fn try_finish(&mut self) -> BracketResult<Podium> {
        self.ensure_editable()?;

        let last = self.bracket.final_match().ok_or(BracketError::IncompleteFinal)?;
        if !last.is_full() {
            return Err(BracketError::IncompleteFinal);
        }
        if last.decided().is_none() {
            return Err(BracketError::TiedScore {
                position: last.position(),
                score: last.first.score,
            });
        }
        let podium = calculate_podium(&self.bracket)?;

        let mut scratch = self.bracket.clone();
        scratch.finished = true;
        scratch.podium = Some(podium.clone());

        let key = scratch.key;
        if let Err(e) = self.repository.commit_matches(&mut scratch) {
            warn!(category = %key, error = %e, "Commit failed, category left open");
            return Err(e.into());
        }

        self.bracket = scratch;
        info!(
            category = %key,
            gold = %podium.gold,
            silver = %podium.silver,
            bronze = podium.bronze.as_deref().unwrap_or("-"),
            "Category finished"
        );
        self.persist_draft();
        Ok(podium)
    }

    /// Provisional podium of the bracket as it stands.
    pub fn podium(&self) -> BracketResult<Podium> {
        calculate_podium(&self.bracket)
    }
}

/// Podium once the final holds two competitors with unequal scores.
///
/// A lone finalist passes through as a bye, which decides nothing.
fn decisive_podium(bracket: &CategoryBracket) -> Option<Podium> {
    bracket
        .final_match()
        .filter(|m| m.is_full() && m.decided().is_some())?;
    calculate_podium(bracket).ok()
}
