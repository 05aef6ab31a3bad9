//! Market settlement rules: one evaluation per market family

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::market::{DoubleChancePick, HandicapSide, Market, ResultPick, TotalSide};
use crate::common::types::Selection;

/// Result of grading one selection against a final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    Won,
    Lost,
    /// Market not recognised; neither won nor lost
    Unsettleable,
}

impl SettlementOutcome {
    /// Only `Won` counts as a win
    pub fn is_win(&self) -> bool {
        matches!(self, SettlementOutcome::Won)
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, SettlementOutcome::Unsettleable)
    }

    fn from_bool(won: bool) -> Self {
        if won {
            SettlementOutcome::Won
        } else {
            SettlementOutcome::Lost
        }
    }
}

/// Stateless grading of markets against final scores
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketSettlementEngine;

impl MarketSettlementEngine {
    pub fn new() -> Self {
        Self
    }

    /// Grade free-text market and pick
    pub fn settle(&self, market: &str, pick: &str, home_score: u32, away_score: u32) -> SettlementOutcome {
        self.evaluate(&Market::classify(market, pick), home_score, away_score)
    }

    /// Grade a selection using its normalized market
    pub fn settle_selection(&self, selection: &Selection, home_score: u32, away_score: u32) -> SettlementOutcome {
        self.evaluate(&selection.market_kind(), home_score, away_score)
    }

    pub fn evaluate(&self, market: &Market, home_score: u32, away_score: u32) -> SettlementOutcome {
        let home = home_score;
        let away = away_score;

        match market {
            Market::OverUnder { side, line } => {
                let total = Decimal::from(home) + Decimal::from(away);
                SettlementOutcome::from_bool(match side {
                    TotalSide::Over => total > *line,
                    TotalSide::Under => total < *line,
                })
            }
            Market::MatchResult { pick } => SettlementOutcome::from_bool(match pick {
                ResultPick::Home => home > away,
                ResultPick::Draw => home == away,
                ResultPick::Away => away > home,
            }),
            Market::BothTeamsToScore { yes } => {
                let both_scored = home > 0 && away > 0;
                SettlementOutcome::from_bool(both_scored == *yes)
            }
            Market::DoubleChance { pick } => SettlementOutcome::from_bool(match pick {
                DoubleChancePick::HomeOrDraw => home >= away,
                DoubleChancePick::DrawOrAway => away >= home,
                DoubleChancePick::HomeOrAway => home != away,
            }),
            Market::CorrectScore {
                home: predicted_home,
                away: predicted_away,
            } => SettlementOutcome::from_bool(*predicted_home == home && *predicted_away == away),
            Market::AsianHandicap { side, handicap } => {
                let (own, other) = match side {
                    HandicapSide::Home => (home, away),
                    HandicapSide::Away => (away, home),
                };
                // a push is graded as a loss
                SettlementOutcome::from_bool(Decimal::from(own) + *handicap > Decimal::from(other))
            }
            Market::Unknown { market, pick } => {
                warn!(
                    market = %market,
                    pick = %pick,
                    score = %format!("{}-{}", home, away),
                    "Unknown market, selection left unsettled"
                );
                SettlementOutcome::Unsettleable
            }
        }
    }
}
