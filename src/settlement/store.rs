//! Slip persistence boundary used by the settlement job

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::common::errors::{PipelineError, Result};
use crate::common::types::Slip;

/// Final result of one selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionResult {
    pub is_won: bool,
    pub home_score: u32,
    pub away_score: u32,
}

/// Storage for slips and their selections
///
/// Every write is a compare-and-set on `is_resulted`, so two settlement runs
/// racing on the same selection cannot both apply a result.
#[async_trait]
pub trait SlipStore: Send + Sync {
    async fn insert(&self, slip: Slip) -> Result<()>;

    async fn get(&self, slip_id: &str) -> Result<Slip>;

    /// Active, unresulted slips whose expiry has passed
    async fn settlement_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Slip>>;

    /// Apply a result unless the selection is already resulted. Returns whether it applied.
    async fn commit_selection(&self, slip_id: &str, index: usize, result: SelectionResult) -> Result<bool>;

    /// Flag a selection whose market cannot be graded, recording the score seen
    async fn mark_unsettleable(&self, slip_id: &str, index: usize, actual_result: &str) -> Result<()>;

    /// Set the slip-level outcome unless already set. Returns whether it applied.
    async fn finalize(&self, slip_id: &str, is_won: bool, now: DateTime<Utc>) -> Result<bool>;
}

/// Slip store held in process memory
#[derive(Debug, Default)]
pub struct InMemorySlipStore {
    slips: RwLock<HashMap<String, Slip>>,
}

impl InMemorySlipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.slips.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SlipStore for InMemorySlipStore {
    async fn insert(&self, slip: Slip) -> Result<()> {
        self.slips.write().await.insert(slip.id.clone(), slip);
        Ok(())
    }

    async fn get(&self, slip_id: &str) -> Result<Slip> {
        self.slips
            .read()
            .await
            .get(slip_id)
            .cloned()
            .ok_or_else(|| PipelineError::SlipNotFound(slip_id.to_string()))
    }

    async fn settlement_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Slip>> {
        let slips = self.slips.read().await;
        let mut candidates: Vec<Slip> = slips
            .values()
            .filter(|slip| slip.is_settlement_candidate(now))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then_with(|| a.id.cmp(&b.id)));
        Ok(candidates)
    }

    async fn commit_selection(&self, slip_id: &str, index: usize, result: SelectionResult) -> Result<bool> {
        let mut slips = self.slips.write().await;
        let slip = slips
            .get_mut(slip_id)
            .ok_or_else(|| PipelineError::SlipNotFound(slip_id.to_string()))?;
        let selection = slip.selections.get_mut(index).ok_or_else(|| {
            PipelineError::Internal(format!("slip {} has no selection {}", slip_id, index))
        })?;

        let applied = selection.resolve(result.is_won, result.home_score, result.away_score);
        if !applied {
            debug!(slip_id, index, "Selection already resulted, commit skipped");
        }
        Ok(applied)
    }

    async fn mark_unsettleable(&self, slip_id: &str, index: usize, actual_result: &str) -> Result<()> {
        let mut slips = self.slips.write().await;
        let slip = slips
            .get_mut(slip_id)
            .ok_or_else(|| PipelineError::SlipNotFound(slip_id.to_string()))?;
        let selection = slip.selections.get_mut(index).ok_or_else(|| {
            PipelineError::Internal(format!("slip {} has no selection {}", slip_id, index))
        })?;

        if !selection.is_resulted {
            selection.unsettleable = true;
            selection.actual_result = Some(actual_result.to_string());
        }
        Ok(())
    }

    async fn finalize(&self, slip_id: &str, is_won: bool, now: DateTime<Utc>) -> Result<bool> {
        let mut slips = self.slips.write().await;
        let slip = slips
            .get_mut(slip_id)
            .ok_or_else(|| PipelineError::SlipNotFound(slip_id.to_string()))?;
        if slip.is_resulted {
            return Ok(false);
        }
        slip.is_resulted = true;
        slip.is_won = Some(is_won);
        slip.result_verified_at = Some(now);
        Ok(true)
    }
}
