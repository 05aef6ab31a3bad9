//! Betslip Engine Library
//!
//! Turns betslip images into structured selections, checks the slip's stated
//! odds, reconciles selections against a fixture catalog and settles slips
//! once final scores are known.

pub mod common;
pub mod config;
pub mod extraction;
pub mod fixtures;
pub mod livescore;
pub mod pipeline;
pub mod settlement;

// Re-export commonly used types
pub use common::errors::{PipelineError, Result};
pub use common::traits::{FixtureCatalog, LivescoreSource};
pub use common::types::{
    DateRange, Fixture, FixtureStatus, LivescoreMatch, OddsValidation, ParsedSlip, Selection, Slip,
    SlipStatus, TextLine,
};
pub use config::types::AppConfig;

pub use extraction::{LineClassifier, LineKind, OddsReconciler, Provider, ProviderOutput, SlipImageReader, SlipParser};
pub use fixtures::{ApiFootballClient, CachedFixtureCatalog, FixtureMatch, FixtureMatcher};
pub use livescore::LivescoreClient;
pub use pipeline::{
    EnrichmentCoordinator, EnrichmentStats, SlipPipeline, SubmissionOutcome, SubmissionReport,
    SubmissionRequest, WorkerPool,
};
pub use settlement::{
    InMemorySlipStore, Market, MarketSettlementEngine, SettlementOutcome, SettlementReport,
    SettlementStats, SlipSettlementOrchestrator, SlipStore,
};
