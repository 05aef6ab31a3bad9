//! Submission path: provider output to an enriched, persisted slip

pub mod enrichment;
pub mod submission;
pub mod worker;

pub use enrichment::{EnrichmentCoordinator, EnrichmentStats};
pub use submission::{SlipPipeline, SubmissionOutcome, SubmissionReport, SubmissionRequest};
pub use worker::WorkerPool;
