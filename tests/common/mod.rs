//! Common test utilities and fixtures

#![allow(dead_code)]

use betslip_engine::common::types::{Fixture, FixtureStatus, LivescoreMatch, TextLine};
use chrono::{DateTime, TimeZone, Utc};

/// Submission time used across the integration tests
pub fn submitted_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 10, 9, 0, 0).unwrap()
}

pub fn kickoff(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, day, hour, 0, 0).unwrap()
}

/// Create a catalog fixture that has not started
pub fn scheduled_fixture(id: &str, home: &str, away: &str, kickoff: DateTime<Utc>) -> Fixture {
    Fixture {
        api_id: id.to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        league: "Premier League".to_string(),
        kickoff,
        status: FixtureStatus::Ns,
        home_goals: None,
        away_goals: None,
    }
}

/// Create a finished scoreboard row
pub fn final_score(home: &str, away: &str, home_score: u32, away_score: u32) -> LivescoreMatch {
    LivescoreMatch {
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_score,
        away_score,
        is_finished: true,
        match_confidence: 0.0,
    }
}

pub fn text_lines(texts: &[&str]) -> Vec<TextLine> {
    texts.iter().map(|text| TextLine::new(*text, 91.0)).collect()
}

/// OCR text of a two-leg accumulator as a bookmaker prints it
pub const ACCUMULATOR_LINES: &[&str] = &[
    "Betslip",
    "Booking Code: SP77X1Q",
    "Man Utd vs Liverpool",
    "Over/Under 2.5",
    "Over",
    "1.85",
    "Arsenal - Chelsea",
    "1X2",
    "Home",
    "2.00",
    "Total Odds: 3.70",
    "Possible Win: 3,700.00",
];

/// Sample upstream payloads
pub mod payloads {
    /// API-Football `GET /fixtures` for 2024-10-12
    pub const FIXTURES_RESPONSE: &str = r#"{
        "get": "fixtures",
        "parameters": {"date": "2024-10-12"},
        "errors": [],
        "results": 2,
        "response": [
            {
                "fixture": {"id": 1035037, "date": "2024-10-12T14:00:00+00:00",
                            "status": {"long": "Match Finished", "short": "FT"}},
                "league": {"name": "Premier League", "country": "England"},
                "teams": {"home": {"name": "Manchester United"}, "away": {"name": "Liverpool"}},
                "goals": {"home": 2, "away": 1}
            },
            {
                "fixture": {"id": 1035038, "date": "2024-10-12T16:30:00+00:00",
                            "status": {"long": "Not Started", "short": "NS"}},
                "league": {"name": "Premier League", "country": "England"},
                "teams": {"home": {"name": "Arsenal"}, "away": {"name": "Chelsea"}},
                "goals": {"home": null, "away": null}
            }
        ]
    }"#;

    /// API-Football reports a bad key with status 200
    pub const FIXTURES_ERROR: &str = r#"{
        "errors": {"token": "Error/Missing application key."},
        "results": 0,
        "response": []
    }"#;

    pub const LIVESCORE_RESPONSE: &str = r#"{
        "matches": [
            {"match_id": "a1", "home_team": "Arsenal", "away_team": "Chelsea",
             "home_score": 3, "away_score": 1, "status": "FT"},
            {"match_id": "a2", "home_team": "Inter", "away_team": "AC Milan",
             "home_score": 1, "away_score": 0, "status": "67'"},
            {"match_id": "a3", "home_team": "Napoli", "away_team": "Lazio",
             "home_score": null, "away_score": null, "status": "FT"}
        ]
    }"#;

    pub const PROVIDER_STRUCTURED: &str = r#"{
        "success": true,
        "structured": {
            "bet_code": "XYZ789",
            "matches": [
                {"home_team": "Arsenal", "away_team": "Chelsea", "bet_type": "1X2",
                 "pick": "1", "odds": 1.80},
                {"home_team": "Real Madrid", "away_team": "Barcelona", "bet_type": "GG/NG",
                 "pick": "GG", "odds": "1.70"}
            ],
            "summary": {"total_odds": 3.06, "possible_win": "306.00"}
        }
    }"#;

    pub const PROVIDER_FAILURE: &str = r#"{"success": false, "error": "image unreadable"}"#;
}
