//! End-to-end handling of one submitted betslip

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::enrichment::{EnrichmentCoordinator, EnrichmentStats};
use crate::common::errors::Result;
use crate::common::types::{OddsValidation, ParsedSlip, Slip};
use crate::extraction::{OddsReconciler, ProviderOutput, SlipImageReader, SlipParser};
use crate::settlement::SlipStore;

/// An image waiting to be turned into a slip
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub slip_id: String,
    pub image: Vec<u8>,
}

impl SubmissionRequest {
    pub fn new(slip_id: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            slip_id: slip_id.into(),
            image,
        }
    }
}

/// What the pipeline hands back for a successful submission
///
/// `validation` is advisory; callers decide whether it warrants review.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub parsed: ParsedSlip,
    pub validation: OddsValidation,
    pub enrichment: EnrichmentStats,
    pub slip: Slip,
}

impl SubmissionReport {
    pub fn needs_review(&self) -> bool {
        !self.validation.is_valid
    }
}

/// Result of one submission as published by the worker pool
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub slip_id: String,
    pub result: Result<SubmissionReport>,
}

/// Provider read, parse, odds check, enrichment and optional persistence
pub struct SlipPipeline {
    reader: Arc<dyn SlipImageReader>,
    parser: SlipParser,
    reconciler: OddsReconciler,
    enrichment: EnrichmentCoordinator,
    store: Option<Arc<dyn SlipStore>>,
}

impl SlipPipeline {
    pub fn new(
        reader: Arc<dyn SlipImageReader>,
        reconciler: OddsReconciler,
        enrichment: EnrichmentCoordinator,
    ) -> Self {
        Self {
            reader,
            parser: SlipParser::new(),
            reconciler,
            enrichment,
            store: None,
        }
    }

    /// Persist every created slip into `store`
    pub fn with_store(mut self, store: Arc<dyn SlipStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn process(&self, request: &SubmissionRequest) -> Result<SubmissionReport> {
        self.process_at(request, Utc::now()).await
    }

    /// Provider failures abort here, before any slip exists
    #[instrument(skip(self, request), fields(slip_id = %request.slip_id, provider = self.reader.name()))]
    pub async fn process_at(&self, request: &SubmissionRequest, now: DateTime<Utc>) -> Result<SubmissionReport> {
        let output = self.reader.read(&request.image).await?;
        self.process_output(&request.slip_id, &output, now).await
    }

    /// Run everything after the provider call
    pub async fn process_output(
        &self,
        slip_id: &str,
        output: &ProviderOutput,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReport> {
        let parsed = self.parser.parse(output, now)?;
        let validation = self.reconciler.validate(&parsed.selections, parsed.total_odds);
        if !validation.is_valid {
            warn!(slip_id, message = %validation.message, "Odds check flagged slip for review");
        }

        let mut slip = Slip::from_parsed(slip_id, parsed.clone(), now);
        let enrichment = self.enrichment.enrich_at(&mut slip.selections, now.date_naive()).await;
        slip.refresh_expiry();

        if let Some(store) = &self.store {
            store.insert(slip.clone()).await?;
        }

        info!(
            slip_id,
            selections = slip.selections.len(),
            confidence = parsed.confidence,
            odds_valid = validation.is_valid,
            expires_at = %slip.expires_at,
            "Slip created"
        );
        Ok(SubmissionReport {
            parsed,
            validation,
            enrichment,
            slip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::PipelineError;
    use crate::common::types::{Fixture, FixtureStatus, TextLine};
    use crate::fixtures::{CachedFixtureCatalog, FixtureMatcher};
    use crate::settlement::InMemorySlipStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    struct StaticReader(std::result::Result<Vec<&'static str>, &'static str>);

    #[async_trait]
    impl SlipImageReader for StaticReader {
        async fn read(&self, _image: &[u8]) -> Result<ProviderOutput> {
            match &self.0 {
                Ok(texts) => Ok(ProviderOutput::Lines(
                    texts.iter().map(|t| TextLine::new(*t, 88.0)).collect(),
                )),
                Err(message) => Err(PipelineError::ExtractionFailure(message.to_string())),
            }
        }

        fn name(&self) -> &'static str {
            "static"
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 10, 9, 0, 0).unwrap()
    }

    async fn pipeline(reader: StaticReader, store: Arc<InMemorySlipStore>) -> SlipPipeline {
        let catalog = CachedFixtureCatalog::offline();
        catalog
            .upsert(vec![Fixture {
                api_id: "868046".to_string(),
                home_team: "Arsenal".to_string(),
                away_team: "Chelsea".to_string(),
                league: "Premier League".to_string(),
                kickoff: Utc.with_ymd_and_hms(2024, 10, 12, 14, 0, 0).unwrap(),
                status: FixtureStatus::Ns,
                home_goals: None,
                away_goals: None,
            }])
            .await;
        let matcher = FixtureMatcher::new(Arc::new(catalog), 75.0);
        SlipPipeline::new(
            Arc::new(reader),
            OddsReconciler::default(),
            EnrichmentCoordinator::cache_only(matcher),
        )
        .with_store(store)
    }

    #[tokio::test]
    async fn test_submission_creates_enriched_slip() {
        let store = Arc::new(InMemorySlipStore::new());
        let reader = StaticReader(Ok(vec![
            "Booking Code: SP9911",
            "Arsenal vs Chelsea",
            "1X2",
            "Home",
            "1.80",
            "Total Odds: 1.80",
        ]));
        let pipeline = pipeline(reader, store.clone()).await;

        let report = pipeline
            .process_at(&SubmissionRequest::new("slip-1", vec![1, 2, 3]), now())
            .await
            .unwrap();

        assert!(!report.needs_review());
        assert_eq!(report.parsed.total_odds, Some(dec!(1.80)));
        assert_eq!(report.enrichment.enriched, 1);
        assert_eq!(report.slip.selections[0].league, "Premier League");
        assert_eq!(
            report.slip.expires_at,
            Utc.with_ymd_and_hms(2024, 10, 12, 14, 0, 0).unwrap()
        );
        assert_eq!(store.get("slip-1").await.unwrap(), report.slip);
    }

    #[tokio::test]
    async fn test_provider_failure_persists_nothing() {
        let store = Arc::new(InMemorySlipStore::new());
        let pipeline = pipeline(StaticReader(Err("image too blurry")), store.clone()).await;

        let result = pipeline
            .process_at(&SubmissionRequest::new("slip-2", vec![]), now())
            .await;

        assert!(matches!(result, Err(PipelineError::ExtractionFailure(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_slip_is_an_error() {
        let store = Arc::new(InMemorySlipStore::new());
        let pipeline = pipeline(StaticReader(Ok(vec!["Betslip", "Total Odds: 2.00"])), store.clone()).await;

        let result = pipeline
            .process_at(&SubmissionRequest::new("slip-3", vec![]), now())
            .await;

        assert!(matches!(result, Err(PipelineError::EmptySlip)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_odds_mismatch_is_advisory() {
        let store = Arc::new(InMemorySlipStore::new());
        let reader = StaticReader(Ok(vec!["Arsenal vs Chelsea", "Home", "1.80", "Total Odds: 2.50"]));
        let pipeline = pipeline(reader, store.clone()).await;

        let report = pipeline
            .process_at(&SubmissionRequest::new("slip-4", vec![]), now())
            .await
            .unwrap();

        assert!(report.needs_review());
        assert_eq!(store.len().await, 1);
    }
}
