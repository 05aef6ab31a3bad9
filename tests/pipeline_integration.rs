//! End-to-end tests of the submission and settlement path
//!
//! Every collaborator is in memory: the fixture catalog is offline and the
//! scoreboard is a fixed list, so these tests need no network.

mod common;

use async_trait::async_trait;
use betslip_engine::common::types::{FixtureStatus, LivescoreMatch};
use betslip_engine::config::types::{AppSettings, MatchingConfig};
use betslip_engine::settlement::SlipVerdict;
use betslip_engine::{
    CachedFixtureCatalog, EnrichmentCoordinator, FixtureMatcher, InMemorySlipStore, LivescoreSource,
    OddsReconciler, ProviderOutput, Result, SlipImageReader, SlipPipeline, SlipSettlementOrchestrator,
    SlipStore,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::*;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::assert_ok;

/// Reader that is never called; tests feed provider output directly
struct UnusedReader;

#[async_trait]
impl SlipImageReader for UnusedReader {
    async fn read(&self, _image: &[u8]) -> Result<ProviderOutput> {
        unreachable!("tests call process_output")
    }

    fn name(&self) -> &'static str {
        "unused"
    }
}

struct FixedScoreboard {
    rows: Vec<LivescoreMatch>,
    calls: AtomicUsize,
}

impl FixedScoreboard {
    fn new(rows: Vec<LivescoreMatch>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LivescoreSource for FixedScoreboard {
    async fn scrape(&self, _date: NaiveDate) -> Result<Vec<LivescoreMatch>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.clone())
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

async fn catalog() -> Arc<CachedFixtureCatalog> {
    let catalog = CachedFixtureCatalog::offline();
    catalog
        .upsert(vec![
            scheduled_fixture("1035037", "Manchester United", "Liverpool", kickoff(12, 14)),
            scheduled_fixture("1035038", "Arsenal", "Chelsea", kickoff(12, 16)),
        ])
        .await;
    Arc::new(catalog)
}

fn pipeline(catalog: Arc<CachedFixtureCatalog>, store: Arc<InMemorySlipStore>) -> SlipPipeline {
    let matcher = FixtureMatcher::new(catalog, 75.0);
    SlipPipeline::new(
        Arc::new(UnusedReader),
        OddsReconciler::default(),
        EnrichmentCoordinator::cache_only(matcher),
    )
    .with_store(store)
}

fn settler(store: Arc<InMemorySlipStore>, scoreboard: Arc<FixedScoreboard>) -> SlipSettlementOrchestrator {
    SlipSettlementOrchestrator::new(store, scoreboard, MatchingConfig::default(), &AppSettings::default())
}

#[test_log::test(tokio::test)]
async fn test_accumulator_from_text_to_won_slip() {
    let store = Arc::new(InMemorySlipStore::new());
    let pipeline = pipeline(catalog().await, store.clone());

    let output = ProviderOutput::Lines(text_lines(ACCUMULATOR_LINES));
    let report = assert_ok!(pipeline.process_output("acca-1", &output, submitted_at()).await);

    assert_eq!(report.parsed.bet_code.as_deref(), Some("SP77X1Q"));
    assert_eq!(report.parsed.selections.len(), 2);
    assert_eq!(report.parsed.possible_win, Some(dec!(3700.00)));
    assert!(report.validation.is_valid, "{}", report.validation.message);
    assert_eq!(report.validation.calculated_odds, dec!(3.70));
    assert_eq!(report.enrichment.enriched, 2);

    let slip = &report.slip;
    assert_eq!(slip.selections[0].home_team, "Manchester United");
    assert_eq!(slip.selections[0].api_match_id.as_deref(), Some("1035037"));
    assert_eq!(slip.selections[1].league, "Premier League");
    assert_eq!(slip.expires_at, kickoff(12, 16));

    // not due yet: nothing is scraped
    let scoreboard = FixedScoreboard::new(vec![]);
    let early = settler(store.clone(), scoreboard.clone());
    let run = assert_ok!(early.run(kickoff(12, 15)).await);
    assert_eq!(run.stats.slips_checked, 0);
    assert_eq!(scoreboard.calls.load(Ordering::SeqCst), 0);

    let scoreboard = FixedScoreboard::new(vec![
        final_score("Manchester United", "Liverpool", 2, 1),
        final_score("Arsenal", "Chelsea", 3, 1),
    ]);
    let settle_at = Utc.with_ymd_and_hms(2024, 10, 12, 21, 0, 0).unwrap();
    let run = assert_ok!(settler(store.clone(), scoreboard.clone()).run(settle_at).await);

    assert_eq!(scoreboard.calls.load(Ordering::SeqCst), 1);
    assert_eq!(run.stats.selections_settled, 2);
    assert_eq!(run.slips[0].verdict, SlipVerdict::Verified { is_won: true });

    let stored = store.get("acca-1").await.unwrap();
    assert!(stored.is_resulted);
    assert_eq!(stored.is_won, Some(true));
    assert_eq!(stored.selections[0].actual_result.as_deref(), Some("2-1"));
    assert_eq!(stored.selections[1].actual_result.as_deref(), Some("3-1"));
}

#[tokio::test]
async fn test_one_losing_leg_loses_the_slip() {
    let store = Arc::new(InMemorySlipStore::new());
    let pipeline = pipeline(catalog().await, store.clone());
    let output = ProviderOutput::Lines(text_lines(ACCUMULATOR_LINES));
    assert_ok!(pipeline.process_output("acca-2", &output, submitted_at()).await);

    let scoreboard = FixedScoreboard::new(vec![
        final_score("Manchester United", "Liverpool", 1, 0),
        final_score("Arsenal", "Chelsea", 3, 1),
    ]);
    let settle_at = kickoff(12, 16) + Duration::hours(5);
    let run = assert_ok!(settler(store.clone(), scoreboard).run(settle_at).await);

    assert_eq!(run.stats.slips_lost, 1);
    let stored = store.get("acca-2").await.unwrap();
    assert_eq!(stored.is_won, Some(false));
    assert_eq!(stored.selections[0].is_won, Some(false));
    assert_eq!(stored.selections[1].is_won, Some(true));
}

#[tokio::test]
async fn test_missing_result_keeps_slip_pending_until_next_run() {
    let store = Arc::new(InMemorySlipStore::new());
    let pipeline = pipeline(catalog().await, store.clone());
    let output = ProviderOutput::Lines(text_lines(ACCUMULATOR_LINES));
    assert_ok!(pipeline.process_output("acca-3", &output, submitted_at()).await);
    let settle_at = kickoff(12, 16) + Duration::hours(5);

    let partial = FixedScoreboard::new(vec![final_score("Manchester United", "Liverpool", 2, 1)]);
    let run = assert_ok!(settler(store.clone(), partial).run(settle_at).await);
    assert_eq!(run.slips[0].verdict, SlipVerdict::Pending);
    let stored = store.get("acca-3").await.unwrap();
    assert!(!stored.is_resulted);
    assert!(stored.selections[0].is_resulted);

    // the settled leg is not settled again
    let complete = FixedScoreboard::new(vec![
        final_score("Manchester United", "Liverpool", 0, 0),
        final_score("Arsenal", "Chelsea", 3, 1),
    ]);
    let run = assert_ok!(settler(store.clone(), complete).run(settle_at).await);
    assert_eq!(run.stats.selections_settled, 1);
    let stored = store.get("acca-3").await.unwrap();
    assert_eq!(stored.selections[0].actual_result.as_deref(), Some("2-1"));
    assert_eq!(stored.is_won, Some(true));
}

#[tokio::test]
async fn test_finished_fixture_settles_during_enrichment() {
    let catalog = CachedFixtureCatalog::offline();
    let mut finished = scheduled_fixture("1035037", "Manchester United", "Liverpool", kickoff(9, 14));
    finished.status = FixtureStatus::Ft;
    finished.home_goals = Some(1);
    finished.away_goals = Some(1);
    catalog.upsert(vec![finished]).await;

    let store = Arc::new(InMemorySlipStore::new());
    let pipeline = pipeline(Arc::new(catalog), store.clone());
    let output = ProviderOutput::Lines(text_lines(&["Man United - Liverpool", "GG", "Yes", "1.70"]));
    let report = assert_ok!(pipeline.process_output("late", &output, submitted_at()).await);

    assert_eq!(report.enrichment.settled_early, 1);
    let selection = &report.slip.selections[0];
    assert!(selection.is_resulted);
    assert_eq!(selection.is_won, Some(true));
    assert_eq!(selection.actual_result.as_deref(), Some("1-1"));

    // the settlement run finalizes it without needing a scoreboard row
    let run = assert_ok!(
        settler(store.clone(), FixedScoreboard::new(vec![]))
            .run(submitted_at() + Duration::minutes(1))
            .await
    );
    assert_eq!(run.slips[0].verdict, SlipVerdict::Verified { is_won: true });
}

#[tokio::test]
async fn test_unknown_market_never_finalizes() {
    let store = Arc::new(InMemorySlipStore::new());
    let pipeline = pipeline(catalog().await, store.clone());
    let output = ProviderOutput::Lines(text_lines(&["Arsenal vs Chelsea", "Corners 1st Half", "Odd", "1.90"]));
    assert_ok!(pipeline.process_output("corners", &output, submitted_at()).await);

    let scoreboard = FixedScoreboard::new(vec![final_score("Arsenal", "Chelsea", 3, 1)]);
    let settle_at = kickoff(12, 16) + Duration::hours(5);
    let run = assert_ok!(settler(store.clone(), scoreboard).run(settle_at).await);

    assert_eq!(run.stats.selections_unsettleable, 1);
    assert_eq!(run.slips[0].verdict, SlipVerdict::Pending);
    let stored = store.get("corners").await.unwrap();
    assert!(!stored.is_resulted);
    assert!(stored.selections[0].unsettleable);
    assert_eq!(stored.selections[0].actual_result.as_deref(), Some("3-1"));
}
