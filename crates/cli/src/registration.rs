//! Registration file: the category key, its tournament window and the
//! registered competitors.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use bracket_core::bracket::{CategoryId, TournamentId};
use bracket_core::{CategoryKey, Registration, TournamentWindow};

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationFile {
    pub tournament_id: TournamentId,
    pub category_id: CategoryId,
    pub window: TournamentWindow,
    #[serde(default)]
    pub competitors: Vec<Registration>,
}

impl RegistrationFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registrations from {:?}", path))?;
        Self::parse(&text).with_context(|| format!("Invalid registration file {:?}", path))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn key(&self) -> CategoryKey {
        CategoryKey::new(self.tournament_id, self.category_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "tournament_id": 7,
        "category_id": 3,
        "window": {
            "starts_at": "2024-05-01T08:00:00Z",
            "ends_at": "2024-05-01T20:00:00Z"
        },
        "competitors": [
            {"competitor_id": 11, "name": "Ana", "registered_at": "2024-04-02T10:00:00Z"},
            {"competitor_id": 12, "name": "Bo", "registered_at": "2024-04-01T10:00:00Z"}
        ]
    }"#;

    #[test]
    fn test_parse() {
        let file = RegistrationFile::parse(SAMPLE).unwrap();
        assert_eq!(file.key(), CategoryKey::new(7, 3));
        assert_eq!(file.competitors.len(), 2);
        assert_eq!(file.competitors[1].name, "Bo");
    }

    #[test]
    fn test_missing_window_is_an_error() {
        let result = RegistrationFile::parse(r#"{"tournament_id": 1, "category_id": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        write!(temp_file, "{}", SAMPLE).unwrap();

        let file = RegistrationFile::load(temp_file.path()).unwrap();
        assert_eq!(file.tournament_id, 7);
    }
}
