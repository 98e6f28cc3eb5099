use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub bracket: BracketConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("brackets.db")
}

/// Bracket editing behavior
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BracketConfig {
    /// Persist a draft after every successful edit (default: true)
    #[serde(default = "default_true")]
    pub drafts_enabled: bool,
    /// Allow pairing the semifinal losers in a bronze bout (default: true)
    #[serde(default = "default_true")]
    pub third_place_match: bool,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            drafts_enabled: true,
            third_place_match: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}
