//! Periodic settlement of expired slips against livescore results

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::engine::{MarketSettlementEngine, SettlementOutcome};
use super::store::{SelectionResult, SlipStore};
use crate::common::errors::Result;
use crate::common::traits::LivescoreSource;
use crate::common::types::{LivescoreMatch, Selection, Slip};
use crate::config::types::{AppSettings, MatchingConfig};
use crate::livescore::match_livescore;

/// Counters for one settlement run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettlementStats {
    pub slips_checked: usize,
    pub slips_verified: usize,
    pub slips_won: usize,
    pub slips_lost: usize,
    pub slips_pending: usize,
    pub slips_no_matches: usize,
    pub selections_settled: usize,
    pub selections_not_found: usize,
    pub selections_unsettleable: usize,
    pub stale_selections: usize,
}

/// Where a slip stands after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlipVerdict {
    Verified { is_won: bool },
    Pending,
    NoMatches,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlipReport {
    pub slip_id: String,
    pub verdict: SlipVerdict,
    pub selections_verified: usize,
    pub selections_not_found: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    pub stats: SettlementStats,
    pub slips: Vec<SlipReport>,
}

pub struct SlipSettlementOrchestrator {
    store: Arc<dyn SlipStore>,
    livescore: Arc<dyn LivescoreSource>,
    engine: MarketSettlementEngine,
    matching: MatchingConfig,
    stale_after: Duration,
}

impl SlipSettlementOrchestrator {
    pub fn new(
        store: Arc<dyn SlipStore>,
        livescore: Arc<dyn LivescoreSource>,
        matching: MatchingConfig,
        settings: &AppSettings,
    ) -> Self {
        Self {
            store,
            livescore,
            engine: MarketSettlementEngine::new(),
            matching,
            stale_after: Duration::hours(settings.stale_after_hours),
        }
    }

    /// Settle every eligible slip
    ///
    /// The scoreboard day is the earliest unresolved kickoff among the due
    /// slips, or today when none is known.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SettlementReport> {
        let candidates = self.store.settlement_candidates(now).await?;
        let date = scoreboard_day(&candidates, now);
        self.settle_candidates(candidates, date, now).await
    }

    /// Settle every eligible slip against the scoreboard of `date`
    pub async fn run_on(&self, date: NaiveDate, now: DateTime<Utc>) -> Result<SettlementReport> {
        let candidates = self.store.settlement_candidates(now).await?;
        self.settle_candidates(candidates, date, now).await
    }

    /// The scoreboard is fetched once and shared by all slips of the run.
    #[instrument(skip(self, candidates), fields(slips = candidates.len()))]
    async fn settle_candidates(
        &self,
        candidates: Vec<Slip>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<SettlementReport> {
        let mut report = SettlementReport::default();
        if candidates.is_empty() {
            info!("No slips due for settlement");
            return Ok(report);
        }

        let scoreboard = self.livescore.scrape(date).await?;
        info!(
            slips = candidates.len(),
            scoreboard = scoreboard.len(),
            source = self.livescore.source_name(),
            "Starting settlement run"
        );

        for slip in &candidates {
            report.stats.slips_checked += 1;
            match self.settle_slip(slip, &scoreboard, now, &mut report.stats).await {
                Ok(slip_report) => report.slips.push(slip_report),
                Err(e) => error!(slip_id = %slip.id, error = %e, "Failed to settle slip"),
            }
        }

        info!(
            checked = report.stats.slips_checked,
            verified = report.stats.slips_verified,
            won = report.stats.slips_won,
            lost = report.stats.slips_lost,
            pending = report.stats.slips_pending,
            "Settlement run complete"
        );
        Ok(report)
    }

    async fn settle_slip(
        &self,
        slip: &Slip,
        scoreboard: &[LivescoreMatch],
        now: DateTime<Utc>,
        stats: &mut SettlementStats,
    ) -> Result<SlipReport> {
        let total = slip.selections.len();
        if total == 0 {
            warn!(slip_id = %slip.id, "Slip has no selections");
            stats.slips_no_matches += 1;
            return Ok(SlipReport {
                slip_id: slip.id.clone(),
                verdict: SlipVerdict::NoMatches,
                selections_verified: 0,
                selections_not_found: 0,
            });
        }

        let mut verified = 0;
        let mut not_found = 0;
        let mut all_won = true;

        for (index, selection) in slip.selections.iter().enumerate() {
            if selection.is_resulted {
                verified += 1;
                all_won &= selection.is_won == Some(true);
                continue;
            }

            let row = match match_livescore(
                &selection.home_team,
                &selection.away_team,
                scoreboard,
                &self.matching,
            ) {
                Some(row) => row,
                None => {
                    not_found += 1;
                    stats.selections_not_found += 1;
                    warn!(
                        slip_id = %slip.id,
                        home = %selection.home_team,
                        away = %selection.away_team,
                        "No livescore match found"
                    );
                    self.check_stale(slip, selection, now, stats);
                    continue;
                }
            };

            if !row.is_finished {
                info!(
                    home = %selection.home_team,
                    away = %selection.away_team,
                    "Match not yet finished"
                );
                self.check_stale(slip, selection, now, stats);
                continue;
            }

            let outcome = self
                .engine
                .settle_selection(selection, row.home_score, row.away_score);
            match outcome {
                SettlementOutcome::Unsettleable => {
                    stats.selections_unsettleable += 1;
                    let score = format!("{}-{}", row.home_score, row.away_score);
                    self.store.mark_unsettleable(&slip.id, index, &score).await?;
                    self.check_stale(slip, selection, now, stats);
                }
                SettlementOutcome::Won | SettlementOutcome::Lost => {
                    let result = SelectionResult {
                        is_won: outcome.is_win(),
                        home_score: row.home_score,
                        away_score: row.away_score,
                    };
                    let is_won = if self.store.commit_selection(&slip.id, index, result).await? {
                        stats.selections_settled += 1;
                        info!(
                            slip_id = %slip.id,
                            home = %selection.home_team,
                            away = %selection.away_team,
                            result = %format!("{}-{}", row.home_score, row.away_score),
                            market = %selection.market,
                            pick = %selection.pick,
                            won = result.is_won,
                            confidence = row.match_confidence,
                            "Selection settled"
                        );
                        result.is_won
                    } else {
                        // another run got there first; trust the stored result
                        let stored = self.store.get(&slip.id).await?;
                        stored
                            .selections
                            .get(index)
                            .and_then(|s| s.is_won)
                            .unwrap_or(false)
                    };
                    verified += 1;
                    all_won &= is_won;
                }
            }
        }

        let verdict = if verified == total {
            if self.store.finalize(&slip.id, all_won, now).await? {
                info!(slip_id = %slip.id, won = all_won, "Slip verified");
            }
            stats.slips_verified += 1;
            if all_won {
                stats.slips_won += 1;
            } else {
                stats.slips_lost += 1;
            }
            SlipVerdict::Verified { is_won: all_won }
        } else {
            stats.slips_pending += 1;
            SlipVerdict::Pending
        };

        Ok(SlipReport {
            slip_id: slip.id.clone(),
            verdict,
            selections_verified: verified,
            selections_not_found: not_found,
        })
    }

    fn check_stale(&self, slip: &Slip, selection: &Selection, now: DateTime<Utc>, stats: &mut SettlementStats) {
        let Some(kickoff) = selection.match_date else {
            return;
        };
        if kickoff + self.stale_after < now {
            stats.stale_selections += 1;
            warn!(
                slip_id = %slip.id,
                home = %selection.home_team,
                away = %selection.away_team,
                kickoff = %kickoff,
                hours_overdue = (now - kickoff).num_hours(),
                "Selection still unresolved past staleness threshold"
            );
        }
    }
}

/// Earliest kickoff of an unresolved selection, capped at today
fn scoreboard_day(candidates: &[Slip], now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    candidates
        .iter()
        .flat_map(|slip| &slip.selections)
        .filter(|selection| !selection.is_resulted)
        .filter_map(|selection| selection.match_date)
        .map(|kickoff| kickoff.date_naive())
        .min()
        .map_or(today, |day| day.min(today))
}
