//! Channel type definitions for handing results back from the worker pool

use tokio::sync::mpsc;

use crate::pipeline::submission::SubmissionOutcome;

/// Default channel buffer size
pub const DEFAULT_CHANNEL_SIZE: usize = 256;

/// Sender half used by workers to publish finished submissions
pub type OutcomeSender = mpsc::Sender<SubmissionOutcome>;

/// Receiver half drained by the surrounding application
pub type OutcomeReceiver = mpsc::Receiver<SubmissionOutcome>;

/// Create a new submission outcome channel with the default buffer size
pub fn create_outcome_channel() -> (OutcomeSender, OutcomeReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_SIZE)
}

/// Create a new submission outcome channel with a custom buffer size
pub fn create_outcome_channel_with_size(size: usize) -> (OutcomeSender, OutcomeReceiver) {
    mpsc::channel(size)
}
