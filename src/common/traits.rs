//! Trait definitions for the external collaborators of the pipeline

use async_trait::async_trait;
use chrono::NaiveDate;

use super::errors::Result;
use super::types::{DateRange, Fixture, LivescoreMatch};

/// Authoritative fixture catalog
///
/// The catalog is owned by the fixture-ingestion side; the pipeline only
/// reads it and may ask it to refresh a day while quota remains.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FixtureCatalog: Send + Sync {
    /// All fixtures whose kickoff falls inside the range
    async fn find(&self, range: DateRange) -> Result<Vec<Fixture>>;

    /// Requests left in the shared daily quota
    fn quota_remaining(&self) -> u32;

    /// Pull one day of fixtures from upstream into the catalog
    ///
    /// Returns the number of fixtures stored. Callers are expected to check
    /// `quota_remaining` first; the check is cooperative, not a lock.
    async fn refresh(&self, date: NaiveDate) -> Result<usize>;
}

/// Source of finished/live match state used for settlement
#[async_trait]
pub trait LivescoreSource: Send + Sync {
    /// Scrape every match listed for the given day
    async fn scrape(&self, date: NaiveDate) -> Result<Vec<LivescoreMatch>>;

    /// Name of the source, for logs
    fn source_name(&self) -> &'static str;
}
