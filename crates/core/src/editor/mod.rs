//! Editing sessions: editability gating and persistence around the engine.

mod session;

pub use session::CategoryEditor;
