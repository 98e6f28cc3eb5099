//! Category lifecycle integration tests.
//!
//! These tests drive a `CategoryEditor` against a SQLite store on disk:
//! - Playing a five-competitor bracket through to a podium
//! - Resuming in-progress work from drafts after a restart
//! - Finalization locking the category and surviving a reload
//! - Tied finals leaving the category open

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use bracket_core::{
    bracket::Advancement, testing::fixtures, BlobStore, BracketConfig, BracketError,
    CategoryEditor, MatchPosition, SlotRef, SlotSide, SqliteBlobStore,
};

const FIVE: [&str; 5] = ["A", "B", "C", "D", "E"];

/// Test helper owning the database directory.
struct TestHarness {
    _temp_dir: TempDir,
    db_path: PathBuf,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("brackets.db");
        Self {
            _temp_dir: temp_dir,
            db_path,
        }
    }

    /// Open the category on a fresh connection, as a restarted process would.
    fn open(&self, names: &[&str]) -> CategoryEditor {
        self.open_with(names, BracketConfig::default())
    }

    fn open_with(&self, names: &[&str], config: BracketConfig) -> CategoryEditor {
        let store: Arc<dyn BlobStore> =
            Arc::new(SqliteBlobStore::new(&self.db_path).expect("Failed to open store"));
        CategoryEditor::open(
            store,
            fixtures::category_key(),
            fixtures::registrations(names),
            fixtures::open_window(),
            config,
        )
        .expect("Failed to open category")
    }
}

fn pos(round: u32, order: u32) -> MatchPosition {
    MatchPosition::new(round, order)
}

fn names_at(editor: &CategoryEditor, round: u32, order: u32) -> (Option<String>, Option<String>) {
    let m = editor.bracket().match_at(pos(round, order)).unwrap();
    (
        m.first.competitor.as_ref().map(|c| c.name.clone()),
        m.second.competitor.as_ref().map(|c| c.name.clone()),
    )
}

fn some(a: &str, b: Option<&str>) -> (Option<String>, Option<String>) {
    (Some(a.to_string()), b.map(str::to_string))
}

/// Play the five-competitor bracket up to a full final between A and E.
fn play_semis(editor: &mut CategoryEditor) {
    // E's bye opens the lower half of round 2.
    let outcome = editor.advance_winner(pos(1, 3)).unwrap();
    assert!(matches!(outcome, Advancement::Created(ref m) if m.position() == pos(2, 2)));

    // The empty fourth pairing has nobody to advance.
    let outcome = editor.advance_winner(pos(1, 4)).unwrap();
    assert_eq!(outcome.label(), "unchanged");

    let outcome = editor.submit_result(pos(1, 1), 10, 3).unwrap();
    assert!(matches!(outcome, Advancement::Created(ref m) if m.position() == pos(2, 1)));

    let outcome = editor.submit_result(pos(1, 2), 2, 5).unwrap();
    assert!(matches!(outcome, Advancement::Filled(_)));
    assert_eq!(names_at(editor, 2, 1), some("A", Some("D")));

    editor.submit_result(pos(2, 1), 1, 0).unwrap();
    let outcome = editor.advance_winner(pos(2, 2)).unwrap();
    assert!(matches!(outcome, Advancement::Filled(_)));
    assert_eq!(names_at(editor, 3, 1), some("A", Some("E")));
}

#[test]
fn test_five_competitor_bracket_to_podium() {
    let harness = TestHarness::new();
    let mut editor = harness.open(&FIVE);

    assert_eq!(editor.bracket().rounds_count(), 3);
    assert_eq!(editor.bracket().bracket_size(), 8);
    assert_eq!(names_at(&editor, 1, 3), some("E", None));

    play_semis(&mut editor);

    let outcome = editor.submit_result(pos(3, 1), 3, 4).unwrap();
    assert!(matches!(outcome, Advancement::Decided(_)));
    assert_eq!(editor.podium().unwrap().gold, "E");

    // Only one semifinal was contested, so there is no bronze bout.
    assert!(matches!(
        editor.create_third_place_match(),
        Err(BracketError::ThirdPlaceUnavailable(_))
    ));

    let podium = editor.finish_category().unwrap();
    assert_eq!(podium.gold, "E");
    assert_eq!(podium.silver, "A");
    assert!(podium.bronze.is_none());
    assert!(editor.is_finished());
}

#[test]
fn test_restart_resumes_from_draft() {
    let harness = TestHarness::new();
    let mut editor = harness.open(&FIVE);
    play_semis(&mut editor);
    let before_restart = editor.bracket().clone();
    drop(editor);

    let resumed = harness.open(&FIVE);
    assert_eq!(resumed.bracket(), &before_restart);
    assert!(resumed.is_editable());
}

#[test]
fn test_finished_category_reloads_locked() {
    let harness = TestHarness::new();
    let mut editor = harness.open(&FIVE);
    play_semis(&mut editor);
    editor.record_score(pos(3, 1), 6, 2).unwrap();
    editor.finish_category().unwrap();
    drop(editor);

    let mut reloaded = harness.open(&FIVE);
    assert!(reloaded.is_finished());
    assert!(!reloaded.is_editable());
    assert_eq!(reloaded.bracket().podium.as_ref().unwrap().gold, "A");
    assert_eq!(names_at(&reloaded, 3, 1), some("A", Some("E")));

    let err = reloaded
        .move_left(SlotRef::new(pos(3, 1), SlotSide::Second))
        .unwrap_err();
    assert!(matches!(err, BracketError::NotEditable { .. }));
}

#[test]
fn test_committed_decided_final_recovers_as_finished() {
    let harness = TestHarness::new();
    let config = BracketConfig {
        drafts_enabled: false,
        ..BracketConfig::default()
    };
    let mut editor = harness.open_with(&["A", "B"], config.clone());
    editor.submit_result(pos(1, 1), 2, 7).unwrap();
    editor.commit().unwrap();
    drop(editor);

    let reloaded = harness.open_with(&["A", "B"], config);
    assert!(reloaded.is_finished());
    assert_eq!(reloaded.bracket().podium.as_ref().unwrap().gold, "B");
}

#[test]
fn test_tied_final_leaves_category_open() {
    let harness = TestHarness::new();
    let mut editor = harness.open(&FIVE);
    play_semis(&mut editor);
    editor.record_score(pos(3, 1), 4, 4).unwrap();

    let err = editor.finish_category().unwrap_err();
    assert!(matches!(err, BracketError::TiedScore { score: 4, .. }));
    assert!(!editor.is_finished());
    drop(editor);

    let reloaded = harness.open(&FIVE);
    assert!(!reloaded.is_finished());
    assert!(reloaded.is_editable());
}

#[test]
fn test_manual_moves_survive_restart() {
    let harness = TestHarness::new();
    let mut editor = harness.open(&FIVE);

    let from = SlotRef::new(pos(1, 2), SlotSide::First);
    let to = editor.move_right(from).unwrap();
    assert_eq!(to, SlotRef::new(pos(2, 1), SlotSide::First));

    let err = editor
        .move_right(SlotRef::new(pos(1, 2), SlotSide::Second))
        .unwrap_err();
    assert!(matches!(err, BracketError::DualMoveViolation { .. }));
    drop(editor);

    let mut resumed = harness.open(&FIVE);
    let origin = resumed.bracket().match_at(pos(1, 2)).unwrap();
    assert!(origin.first.moved);

    assert_eq!(resumed.move_left(to).unwrap(), Some(from));
    let origin = resumed.bracket().match_at(pos(1, 2)).unwrap();
    assert!(!origin.first.moved);
    assert_eq!(names_at(&resumed, 2, 1), (None, None));
}
