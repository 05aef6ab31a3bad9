//! Grading selections and finalizing slips

pub mod engine;
pub mod market;
pub mod orchestrator;
pub mod store;

pub use engine::{MarketSettlementEngine, SettlementOutcome};
pub use market::Market;
pub use orchestrator::{SettlementReport, SettlementStats, SlipSettlementOrchestrator, SlipVerdict};
pub use store::{InMemorySlipStore, SelectionResult, SlipStore};
