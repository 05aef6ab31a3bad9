//! Livescore feed wire types

use serde::{Deserialize, Serialize};

use crate::common::types::LivescoreMatch;

/// Envelope of `GET {base}/{date}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivescoreResponse {
    #[serde(default)]
    pub matches: Vec<LivescoreEntry>,
}

/// One row of the scoreboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivescoreEntry {
    #[serde(default)]
    pub match_id: Option<String>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    /// Clock or state text such as `45'`, `HT`, `FT`, `AET`, `Pen`
    #[serde(default)]
    pub status: Option<String>,
}

impl LivescoreEntry {
    /// Finished by status text; a finished row without scores is not usable
    pub fn status_is_final(&self) -> bool {
        match self.status.as_deref().map(str::trim) {
            Some(status) => {
                status.contains("FT")
                    || status.contains("AET")
                    || status.contains("Pen")
                    || status == "90+"
            }
            None => false,
        }
    }

    /// Convert to the shared model. Rows without team names are dropped.
    pub fn into_match(self) -> Option<LivescoreMatch> {
        let home_team = self.home_team.trim().to_string();
        let away_team = self.away_team.trim().to_string();
        if home_team.is_empty() || away_team.is_empty() {
            return None;
        }
        let is_finished =
            self.status_is_final() && self.home_score.is_some() && self.away_score.is_some();

        Some(LivescoreMatch {
            home_team,
            away_team,
            home_score: self.home_score.unwrap_or_default(),
            away_score: self.away_score.unwrap_or_default(),
            is_finished,
            match_confidence: 0.0,
        })
    }
}
