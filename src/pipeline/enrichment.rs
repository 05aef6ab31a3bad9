//! Canonicalization of parsed selections against the fixture catalog

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

use crate::common::errors::PipelineError;
use crate::common::types::Selection;
use crate::config::types::FixtureFeedConfig;
use crate::fixtures::matcher::{search_window, FixtureMatch};
use crate::fixtures::FixtureMatcher;
use crate::settlement::{MarketSettlementEngine, SettlementOutcome};

/// Per-slip enrichment counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentStats {
    pub total: usize,
    pub enriched: usize,
    pub failed: usize,
    pub already_enriched: usize,
    pub settled_early: usize,
}

/// Rewrites selections with canonical fixture data
///
/// Enrichment is best-effort: a selection that cannot be matched keeps its
/// free-text values and the slip is still created.
pub struct EnrichmentCoordinator {
    matcher: FixtureMatcher,
    engine: MarketSettlementEngine,
    max_refresh_days: usize,
}

impl EnrichmentCoordinator {
    pub fn new(matcher: FixtureMatcher, max_refresh_days: usize) -> Self {
        Self {
            matcher,
            engine: MarketSettlementEngine::new(),
            max_refresh_days,
        }
    }

    pub fn from_config(matcher: FixtureMatcher, config: &FixtureFeedConfig) -> Self {
        Self::new(matcher, config.refresh_days as usize)
    }

    /// Coordinator that only reads what the catalog already holds
    pub fn cache_only(matcher: FixtureMatcher) -> Self {
        Self::new(matcher, 0)
    }

    pub async fn enrich(&self, selections: &mut [Selection]) -> EnrichmentStats {
        self.enrich_at(selections, Utc::now().date_naive()).await
    }

    #[instrument(skip(self, selections), fields(selections = selections.len()))]
    pub async fn enrich_at(&self, selections: &mut [Selection], today: NaiveDate) -> EnrichmentStats {
        let mut stats = EnrichmentStats {
            total: selections.len(),
            ..Default::default()
        };

        self.refresh_window(selections, today).await;

        for selection in selections.iter_mut() {
            if selection.is_resulted || selection.is_enriched() {
                stats.already_enriched += 1;
                continue;
            }

            let found = self
                .matcher
                .find_match_at(&selection.home_team, &selection.away_team, selection.match_date, today)
                .await;
            match found {
                Ok(Some(found)) => {
                    stats.enriched += 1;
                    if self.apply(selection, found) {
                        stats.settled_early += 1;
                    }
                }
                Ok(None) => stats.failed += 1,
                Err(e) => {
                    warn!(
                        home = %selection.home_team,
                        away = %selection.away_team,
                        error = %e,
                        "Catalog lookup failed, selection left unresolved"
                    );
                    stats.failed += 1;
                }
            }
        }

        info!(
            total = stats.total,
            enriched = stats.enriched,
            failed = stats.failed,
            already_enriched = stats.already_enriched,
            settled_early = stats.settled_early,
            "Enrichment complete"
        );
        stats
    }

    /// Overwrite the selection with the fixture. Returns whether it was settled.
    fn apply(&self, selection: &mut Selection, found: FixtureMatch) -> bool {
        let fixture = found.fixture;
        selection.home_team = fixture.home_team.clone();
        selection.away_team = fixture.away_team.clone();
        selection.league = fixture.league.clone();
        selection.match_date = Some(fixture.kickoff);
        selection.api_match_id = Some(fixture.api_id.clone());
        selection.normalize_market();

        let Some((home, away)) = fixture.final_score() else {
            return false;
        };
        match self.engine.settle_selection(selection, home, away) {
            SettlementOutcome::Won => selection.resolve(true, home, away),
            SettlementOutcome::Lost => selection.resolve(false, home, away),
            SettlementOutcome::Unsettleable => {
                selection.unsettleable = true;
                selection.actual_result = Some(fixture.result_string());
                false
            }
        }
    }

    /// Refresh the catalog for the days the pending selections will search
    ///
    /// Stops at the first sign of an exhausted quota and carries on with
    /// whatever the catalog already has.
    async fn refresh_window(&self, selections: &[Selection], today: NaiveDate) {
        if self.max_refresh_days == 0 {
            return;
        }

        let days: BTreeSet<NaiveDate> = selections
            .iter()
            .filter(|s| !s.is_resulted && !s.is_enriched())
            .flat_map(|s| search_window(s.match_date, today).days().collect::<Vec<_>>())
            .collect();

        let catalog = self.matcher.catalog();
        for day in days.into_iter().take(self.max_refresh_days) {
            if catalog.quota_remaining() == 0 {
                warn!(%day, "Fixture quota exhausted, matching against cached fixtures");
                break;
            }
            match catalog.refresh(day).await {
                Ok(count) => debug!(%day, count, "Catalog day ready"),
                Err(PipelineError::QuotaExhausted { limit }) => {
                    warn!(%day, limit, "Fixture quota exhausted, matching against cached fixtures");
                    break;
                }
                Err(e) => warn!(%day, error = %e, "Catalog refresh failed"),
            }
        }
    }
}
