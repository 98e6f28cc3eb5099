pub mod bracket;
pub mod config;
pub mod editor;
pub mod metrics;
pub mod store;
pub mod testing;

pub use bracket::{
    Advancement, BracketError, BracketResult, CategoryBracket, CategoryKey, Competitor, Match,
    MatchKind, MatchPosition, Podium, Registration, SeedList, Slot, SlotRef, SlotSide,
    TournamentWindow,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, BracketConfig,
    Config, ConfigError, DatabaseConfig, LoggingConfig,
};
pub use editor::CategoryEditor;
pub use store::{BlobStore, BracketRepository, BracketStateStore, SqliteBlobStore, StoreError};
