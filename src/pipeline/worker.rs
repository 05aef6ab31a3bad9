//! Fixed-size worker pool that runs submissions off the caller's task

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use super::submission::{SlipPipeline, SubmissionOutcome, SubmissionRequest};
use crate::common::channels::OutcomeSender;
use crate::common::errors::{PipelineError, Result};
use crate::config::types::WorkerConfig;

/// Bounded queue of submissions served by a fixed set of workers
///
/// Submissions are independent, so completion order is not submission
/// order. `shutdown` stops intake and waits for queued work to finish.
pub struct WorkerPool {
    sender: Option<mpsc::Sender<SubmissionRequest>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(pipeline: Arc<SlipPipeline>, outcomes: OutcomeSender, pool_size: usize, queue_depth: usize) -> Self {
        let pool_size = pool_size.max(1);
        let (sender, receiver) = mpsc::channel(queue_depth.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..pool_size)
            .map(|id| {
                let pipeline = Arc::clone(&pipeline);
                let receiver = Arc::clone(&receiver);
                let outcomes = outcomes.clone();
                tokio::spawn(
                    run_worker(pipeline, receiver, outcomes)
                        .instrument(tracing::info_span!("worker", id)),
                )
            })
            .collect();

        info!(pool_size, queue_depth, "Worker pool started");
        Self {
            sender: Some(sender),
            workers,
        }
    }

    pub fn from_config(pipeline: Arc<SlipPipeline>, outcomes: OutcomeSender, config: &WorkerConfig) -> Self {
        Self::new(pipeline, outcomes, config.pool_size, config.queue_depth)
    }

    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a submission without waiting for room
    pub fn submit(&self, request: SubmissionRequest) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(PipelineError::QueueClosed)?;
        sender.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(request) => {
                warn!(slip_id = %request.slip_id, "Submission queue full");
                PipelineError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => PipelineError::QueueClosed,
        })
    }

    /// Stop accepting work and drain the queue
    pub async fn shutdown(mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task ended abnormally");
            }
        }
        info!("Worker pool drained");
    }
}

async fn run_worker(
    pipeline: Arc<SlipPipeline>,
    receiver: Arc<Mutex<mpsc::Receiver<SubmissionRequest>>>,
    outcomes: OutcomeSender,
) {
    loop {
        // lock is released before the submission runs
        let next = receiver.lock().await.recv().await;
        let Some(request) = next else {
            debug!("Queue closed, worker exiting");
            break;
        };

        let result = pipeline.process(&request).await;
        if let Err(e) = &result {
            warn!(slip_id = %request.slip_id, error = %e, "Submission failed");
        }
        let outcome = SubmissionOutcome {
            slip_id: request.slip_id,
            result,
        };
        if outcomes.send(outcome).await.is_err() {
            debug!("Outcome receiver dropped");
        }
    }
}
