//! Prometheus metrics for the bracket engine.
//!
//! This module provides metrics for:
//! - Bracket construction and winner advancement
//! - Manual slot moves
//! - Draft persistence and category finishing

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Engine
// =============================================================================

/// Brackets built from seeds and committed rows.
pub static BRACKETS_BUILT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("bracket_builds_total", "Total brackets built").unwrap()
});

/// Winner advancements by outcome.
pub static ADVANCEMENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bracket_advancements_total", "Total winner advancements"),
        &["outcome"], // "filled", "created", "unchanged", "decided"
    )
    .unwrap()
});

/// Manual slot moves by direction and result.
pub static SLOT_MOVES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bracket_slot_moves_total", "Total manual slot moves"),
        &["direction", "result"], // "right"/"left", "ok"/"noop"/"rejected"
    )
    .unwrap()
});

// =============================================================================
// Persistence
// =============================================================================

/// Draft saves by result.
pub static DRAFT_SAVES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bracket_draft_saves_total", "Total draft saves"),
        &["result"], // "ok", "failed"
    )
    .unwrap()
});

/// Category finish attempts by result.
pub static CATEGORIES_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bracket_categories_finished_total",
            "Total category finish attempts",
        ),
        &["result"], // "finished", "rejected", "failed"
    )
    .unwrap()
});

/// Returns all metrics for registration with a Prometheus registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(BRACKETS_BUILT.clone()),
        Box::new(ADVANCEMENTS.clone()),
        Box::new(SLOT_MOVES.clone()),
        Box::new(DRAFT_SAVES.clone()),
        Box::new(CATEGORIES_FINISHED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        ADVANCEMENTS.with_label_values(&["filled"]).inc();
        let names: Vec<_> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"bracket_advancements_total".to_string()));
    }
}
