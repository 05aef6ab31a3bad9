//! Betslip extraction: provider output to a validated `ParsedSlip`

pub mod classifier;
pub mod parser;
pub mod patterns;
pub mod provider;
pub mod reconciler;

pub use classifier::{LineClassifier, LineKind};
pub use parser::SlipParser;
pub use provider::{Provider, ProviderOutput, SlipImageReader};
pub use reconciler::OddsReconciler;
