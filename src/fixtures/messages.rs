//! API-Football fixture feed wire types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::types::{Fixture, FixtureStatus};

/// Envelope of `GET /fixtures`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturesResponse {
    #[serde(default)]
    pub results: u32,
    /// Upstream reports problems here with a 200 status
    #[serde(default)]
    pub errors: serde_json::Value,
    #[serde(default)]
    pub response: Vec<FixtureEntry>,
}

impl FixturesResponse {
    /// Error text when the `errors` field is a non-empty list or object
    pub fn error_message(&self) -> Option<String> {
        match &self.errors {
            serde_json::Value::Array(items) if !items.is_empty() => Some(self.errors.to_string()),
            serde_json::Value::Object(map) if !map.is_empty() => Some(self.errors.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureEntry {
    pub fixture: FixtureInfo,
    pub league: LeagueInfo,
    pub teams: Teams,
    #[serde(default)]
    pub goals: Goals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureInfo {
    pub id: u64,
    pub date: DateTime<Utc>,
    pub status: StatusInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub short: String,
    #[serde(default)]
    pub long: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueInfo {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teams {
    pub home: TeamInfo,
    pub away: TeamInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInfo {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Goals {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

impl FixtureEntry {
    /// Convert to the catalog model. Unknown status codes are skipped.
    pub fn into_fixture(self) -> Option<Fixture> {
        let status = FixtureStatus::from_short(&self.fixture.status.short)?;
        Some(Fixture {
            api_id: self.fixture.id.to_string(),
            home_team: self.teams.home.name,
            away_team: self.teams.away.name,
            league: self.league.name,
            kickoff: self.fixture.date,
            status,
            home_goals: self.goals.home,
            away_goals: self.goals.away,
        })
    }
}
