//! Unified types shared by extraction, enrichment and settlement

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::settlement::market::Market;

/// League label used until enrichment finds the real competition
pub const UNKNOWN_LEAGUE: &str = "Unknown League";

/// Market label used when a slip does not print one
pub const DEFAULT_MARKET: &str = "3-Way";

/// One line of text produced by an OCR/vision provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// Provider confidence in the range 0..=100
    #[serde(default)]
    pub confidence: f64,
}

impl TextLine {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// One leg of a slip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub market: String,
    pub pick: String,
    pub odds: Decimal,
    #[serde(default)]
    pub match_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub api_match_id: Option<String>,
    #[serde(default)]
    pub is_resulted: bool,
    #[serde(default)]
    pub is_won: Option<bool>,
    /// Final score as "H-A"
    #[serde(default)]
    pub actual_result: Option<String>,
    /// Set when the market could not be graded; blocks slip finalization
    #[serde(default)]
    pub unsettleable: bool,
    /// Market and pick normalized when the selection was created or enriched
    #[serde(default)]
    pub normalized_market: Option<Market>,
}

impl Selection {
    /// Create an unresolved selection with placeholder league and no kickoff
    pub fn new(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        market: impl Into<String>,
        pick: impl Into<String>,
        odds: Decimal,
    ) -> Self {
        let home_team = home_team.into();
        let away_team = away_team.into();
        let market = market.into();
        let pick = pick.into();
        let normalized_market = Some(Market::classify_for_teams(&market, &pick, &home_team, &away_team));
        Self {
            home_team,
            away_team,
            league: UNKNOWN_LEAGUE.to_string(),
            market,
            pick,
            odds,
            match_date: None,
            api_match_id: None,
            is_resulted: false,
            is_won: None,
            actual_result: None,
            unsettleable: false,
            normalized_market,
        }
    }

    /// Normalized market, classifying the free text if it was never stored
    pub fn market_kind(&self) -> Market {
        self.normalized_market
            .clone()
            .unwrap_or_else(|| self.classify_market())
    }

    /// Re-read market and pick into the closed market set
    pub fn normalize_market(&mut self) {
        self.normalized_market = Some(self.classify_market());
    }

    fn classify_market(&self) -> Market {
        Market::classify_for_teams(&self.market, &self.pick, &self.home_team, &self.away_team)
    }

    pub fn with_match_date(mut self, match_date: DateTime<Utc>) -> Self {
        self.match_date = Some(match_date);
        self
    }

    /// Whether enrichment has linked this selection to a catalog fixture
    pub fn is_enriched(&self) -> bool {
        self.api_match_id.is_some()
    }

    /// Apply a final result. Returns false if the selection was already resulted.
    pub fn resolve(&mut self, is_won: bool, home_score: u32, away_score: u32) -> bool {
        if self.is_resulted {
            return false;
        }
        self.is_resulted = true;
        self.is_won = Some(is_won);
        self.actual_result = Some(format!("{}-{}", home_score, away_score));
        self.unsettleable = false;
        true
    }
}

/// Structured result of parsing one slip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSlip {
    pub bet_code: Option<String>,
    pub total_odds: Option<Decimal>,
    pub possible_win: Option<Decimal>,
    pub selections: Vec<Selection>,
    pub confidence: f64,
}

/// Advisory verdict comparing stated total odds with the recomputed product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsValidation {
    pub is_valid: bool,
    pub calculated_odds: Decimal,
    pub extracted_odds: Option<Decimal>,
    pub difference_pct: Option<f64>,
    pub message: String,
}

/// Fixture status short codes as published by the fixture feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FixtureStatus {
    /// Time to be defined
    Tbd,
    /// Not started
    Ns,
    #[serde(rename = "1H")]
    FirstHalf,
    Ht,
    #[serde(rename = "2H")]
    SecondHalf,
    Et,
    Bt,
    P,
    Ft,
    Aet,
    Pen,
    Susp,
    Int,
    Pst,
    Canc,
    Abd,
    Awd,
    Wo,
}

impl FixtureStatus {
    pub fn from_short(code: &str) -> Option<Self> {
        let status = match code.trim().to_uppercase().as_str() {
            "TBD" => Self::Tbd,
            "NS" => Self::Ns,
            "1H" => Self::FirstHalf,
            "HT" => Self::Ht,
            "2H" => Self::SecondHalf,
            "ET" => Self::Et,
            "BT" => Self::Bt,
            "P" => Self::P,
            "FT" => Self::Ft,
            "AET" => Self::Aet,
            "PEN" => Self::Pen,
            "SUSP" => Self::Susp,
            "INT" => Self::Int,
            "PST" => Self::Pst,
            "CANC" => Self::Canc,
            "ABD" => Self::Abd,
            "AWD" => Self::Awd,
            "WO" => Self::Wo,
            _ => return None,
        };
        Some(status)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Ft | Self::Aet | Self::Pen)
    }

    pub fn is_live(&self) -> bool {
        matches!(
            self,
            Self::FirstHalf | Self::Ht | Self::SecondHalf | Self::Et | Self::Bt | Self::P
        )
    }
}

impl std::fmt::Display for FixtureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::Tbd => "TBD",
            Self::Ns => "NS",
            Self::FirstHalf => "1H",
            Self::Ht => "HT",
            Self::SecondHalf => "2H",
            Self::Et => "ET",
            Self::Bt => "BT",
            Self::P => "P",
            Self::Ft => "FT",
            Self::Aet => "AET",
            Self::Pen => "PEN",
            Self::Susp => "SUSP",
            Self::Int => "INT",
            Self::Pst => "PST",
            Self::Canc => "CANC",
            Self::Abd => "ABD",
            Self::Awd => "AWD",
            Self::Wo => "WO",
        };
        write!(f, "{}", code)
    }
}

/// Authoritative fixture from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub api_id: String,
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub kickoff: DateTime<Utc>,
    pub status: FixtureStatus,
    #[serde(default)]
    pub home_goals: Option<u32>,
    #[serde(default)]
    pub away_goals: Option<u32>,
}

impl Fixture {
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Final score as (home, away) once the fixture is finished and scored
    pub fn final_score(&self) -> Option<(u32, u32)> {
        if !self.is_finished() {
            return None;
        }
        Some((self.home_goals?, self.away_goals?))
    }

    /// Score as "H-A", or the status code when no score is known
    pub fn result_string(&self) -> String {
        match (self.home_goals, self.away_goals) {
            (Some(home), Some(away)) => format!("{}-{}", home, away),
            _ => self.status.to_string(),
        }
    }
}

/// Match state reported by the livescore feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivescoreMatch {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub is_finished: bool,
    /// Average team similarity of the match that selected this entry
    #[serde(default)]
    pub match_confidence: f64,
}

/// Half-open range of calendar days `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, when: &DateTime<Utc>) -> bool {
        let day = when.date_naive();
        day >= self.start && day < self.end
    }

    /// Every day covered by the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |day| *day < self.end)
    }
}

/// Publication status of a slip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlipStatus {
    PendingApproval,
    Active,
    Rejected,
}

/// A persisted slip together with its selections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slip {
    pub id: String,
    #[serde(default)]
    pub bet_code: Option<String>,
    pub status: SlipStatus,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub total_odds: Option<Decimal>,
    #[serde(default)]
    pub is_resulted: bool,
    #[serde(default)]
    pub is_won: Option<bool>,
    #[serde(default)]
    pub result_verified_at: Option<DateTime<Utc>>,
    pub selections: Vec<Selection>,
}

impl Slip {
    /// Build an active slip from a parse result
    pub fn from_parsed(id: impl Into<String>, parsed: ParsedSlip, now: DateTime<Utc>) -> Self {
        let mut slip = Self {
            id: id.into(),
            bet_code: parsed.bet_code,
            status: SlipStatus::Active,
            expires_at: now + Duration::days(1),
            total_odds: parsed.total_odds,
            is_resulted: false,
            is_won: None,
            result_verified_at: None,
            selections: parsed.selections,
        };
        slip.refresh_expiry();
        slip
    }

    /// Move `expires_at` to the latest known kickoff
    pub fn refresh_expiry(&mut self) {
        if let Some(latest) = self.selections.iter().filter_map(|s| s.match_date).max() {
            self.expires_at = latest;
        }
    }

    /// Accumulator semantics: true iff there is at least one selection and all won
    pub fn all_selections_won(&self) -> bool {
        !self.selections.is_empty() && self.selections.iter().all(|s| s.is_won == Some(true))
    }

    /// Slip-level outcome, defined only once every selection is resulted
    pub fn outcome(&self) -> Option<bool> {
        if self.selections.is_empty() || !self.selections.iter().all(|s| s.is_resulted) {
            return None;
        }
        Some(self.all_selections_won())
    }

    /// Whether the settlement job should look at this slip
    pub fn is_settlement_candidate(&self, now: DateTime<Utc>) -> bool {
        self.status == SlipStatus::Active && !self.is_resulted && self.expires_at < now
    }
}
