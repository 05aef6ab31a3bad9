//! Cross-check of stated total odds against the product of selection odds

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::common::types::{OddsValidation, Selection};
use crate::config::types::ValidationConfig;

/// Advisory odds reconciler. Never fails; every outcome is an `OddsValidation`.
#[derive(Debug, Clone, Copy)]
pub struct OddsReconciler {
    tolerance_pct: Decimal,
}

impl Default for OddsReconciler {
    fn default() -> Self {
        Self::from_config(&ValidationConfig::default())
    }
}

impl OddsReconciler {
    pub fn new(tolerance_pct: Decimal) -> Self {
        Self { tolerance_pct }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(Decimal::try_from(config.odds_tolerance_pct).unwrap_or(Decimal::new(5, 0)))
    }

    /// Product of selection odds, rounded to two decimals.
    /// `None` when a leg has no odds, or the product overflows or rounds to zero.
    pub fn calculated_odds(selections: &[Selection]) -> Option<Decimal> {
        if missing_odds(selections) {
            return None;
        }
        selections
            .iter()
            .try_fold(Decimal::ONE, |acc, selection| acc.checked_mul(selection.odds))
            .map(|product| product.round_dp(2))
            .filter(|product| !product.is_zero())
    }

    pub fn validate(&self, selections: &[Selection], extracted: Option<Decimal>) -> OddsValidation {
        let Some(calculated) = Self::calculated_odds(selections) else {
            let reason = if missing_odds(selections) {
                "missing odds"
            } else {
                "odds product out of range"
            };
            warn!(count = selections.len(), reason, "Cannot validate odds");
            return OddsValidation {
                is_valid: false,
                calculated_odds: Decimal::ZERO,
                extracted_odds: extracted,
                difference_pct: None,
                message: format!("Cannot validate, {}", reason),
            };
        };

        let extracted_odds = match extracted.filter(|odds| *odds > Decimal::ZERO) {
            Some(odds) => odds,
            None => {
                return OddsValidation {
                    is_valid: false,
                    calculated_odds: calculated,
                    extracted_odds: None,
                    difference_pct: None,
                    message: format!(
                        "Total odds not extracted, calculated {}; verify manually",
                        calculated
                    ),
                };
            }
        };

        let difference = (calculated - extracted_odds).abs();
        let hundred = Decimal::ONE_HUNDRED;
        let percent_of = |base: Decimal| {
            difference
                .checked_div(base)
                .and_then(|ratio| ratio.checked_mul(hundred))
        };
        let is_valid = percent_of(extracted_odds).is_some_and(|pct| pct <= self.tolerance_pct);
        let difference_pct = percent_of(calculated).and_then(|pct| pct.round_dp(2).to_f64());

        debug!(%calculated, extracted = %extracted_odds, ?difference_pct, is_valid, "Odds reconciled");

        let message = if is_valid {
            format!("Odds verified: {} matches {}", calculated, extracted_odds)
        } else {
            format!(
                "Odds mismatch: calculated {}, slip shows {} ({:.2}% apart)",
                calculated,
                extracted_odds,
                difference_pct.unwrap_or_default()
            )
        };

        OddsValidation {
            is_valid,
            calculated_odds: calculated,
            extracted_odds: Some(extracted_odds),
            difference_pct,
            message,
        }
    }
}

fn missing_odds(selections: &[Selection]) -> bool {
    selections.is_empty() || selections.iter().any(|s| s.odds <= Decimal::ZERO)
}
