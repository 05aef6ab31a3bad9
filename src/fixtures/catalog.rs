//! In-memory fixture catalog backed by the API-Football feed

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::api_football::ApiFootballClient;
use crate::common::errors::{PipelineError, Result};
use crate::common::traits::FixtureCatalog;
use crate::common::types::{DateRange, Fixture};
use crate::config::types::FixtureFeedConfig;

/// Daily request budget that resets at UTC midnight
///
/// Checking and spending are separate steps for callers; only `try_acquire`
/// spends, so a concurrent caller can still find the budget gone.
#[derive(Debug)]
pub struct QuotaTracker {
    limit: u32,
    state: Mutex<(NaiveDate, u32)>,
}

impl QuotaTracker {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            state: Mutex::new((Utc::now().date_naive(), 0)),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_on(Utc::now().date_naive())
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_on(Utc::now().date_naive())
    }

    pub fn remaining_on(&self, today: NaiveDate) -> u32 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        roll_over(&mut state, today);
        self.limit.saturating_sub(state.1)
    }

    pub fn try_acquire_on(&self, today: NaiveDate) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        roll_over(&mut state, today);
        if state.1 >= self.limit {
            return false;
        }
        state.1 += 1;
        true
    }
}

fn roll_over(state: &mut (NaiveDate, u32), today: NaiveDate) {
    if state.0 != today {
        *state = (today, 0);
    }
}

/// How long a refreshed day is served from cache
pub const REFRESH_TTL_MINUTES: i64 = 60;

/// Fixture catalog cached in memory, refreshed a day at a time from upstream
#[derive(Debug)]
pub struct CachedFixtureCatalog {
    fixtures: RwLock<HashMap<String, Fixture>>,
    refreshed_at: RwLock<HashMap<NaiveDate, DateTime<Utc>>>,
    client: Option<ApiFootballClient>,
    quota: QuotaTracker,
}

impl CachedFixtureCatalog {
    pub fn new(client: Option<ApiFootballClient>, daily_limit: u32) -> Self {
        Self {
            fixtures: RwLock::new(HashMap::new()),
            refreshed_at: RwLock::new(HashMap::new()),
            client,
            quota: QuotaTracker::new(daily_limit),
        }
    }

    /// Catalog with no upstream; only `upsert` fills it
    pub fn offline() -> Self {
        Self::new(None, 0)
    }

    pub fn from_config(config: &FixtureFeedConfig) -> Result<Self> {
        let client = match config.api_key {
            Some(_) => Some(ApiFootballClient::from_config(config)?),
            None => {
                warn!("No fixture feed API key, catalog runs offline");
                None
            }
        };
        Ok(Self::new(client, config.daily_limit))
    }

    /// Insert or replace fixtures by id. Returns how many were written.
    pub async fn upsert(&self, fixtures: impl IntoIterator<Item = Fixture>) -> usize {
        let mut store = self.fixtures.write().await;
        let mut written = 0;
        for fixture in fixtures {
            store.insert(fixture.api_id.clone(), fixture);
            written += 1;
        }
        written
    }

    async fn is_fresh(&self, date: NaiveDate, now: DateTime<Utc>) -> bool {
        self.refreshed_at
            .read()
            .await
            .get(&date)
            .map_or(false, |at| now - *at < Duration::minutes(REFRESH_TTL_MINUTES))
    }

    async fn cached_on(&self, date: NaiveDate) -> usize {
        self.fixtures
            .read()
            .await
            .values()
            .filter(|fixture| fixture.kickoff.date_naive() == date)
            .count()
    }

    pub async fn len(&self) -> usize {
        self.fixtures.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl FixtureCatalog for CachedFixtureCatalog {
    async fn find(&self, range: DateRange) -> Result<Vec<Fixture>> {
        let store = self.fixtures.read().await;
        let mut found: Vec<Fixture> = store
            .values()
            .filter(|fixture| range.contains(&fixture.kickoff))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.kickoff.cmp(&b.kickoff).then_with(|| a.api_id.cmp(&b.api_id)));
        Ok(found)
    }

    fn quota_remaining(&self) -> u32 {
        match self.client {
            Some(_) => self.quota.remaining(),
            None => 0,
        }
    }

    #[instrument(skip(self))]
    async fn refresh(&self, date: NaiveDate) -> Result<usize> {
        let client = self.client.as_ref().ok_or_else(|| {
            PipelineError::Configuration("fixture feed is not configured".to_string())
        })?;
        let now = Utc::now();
        if self.is_fresh(date, now).await {
            let cached = self.cached_on(date).await;
            debug!(%date, cached, "Day served from cache");
            return Ok(cached);
        }
        if !self.quota.try_acquire() {
            warn!(%date, limit = self.quota.limit(), "Fixture feed quota exhausted, serving cache");
            return Err(PipelineError::QuotaExhausted {
                limit: self.quota.limit(),
            });
        }

        let fixtures = client.fixtures_on(date).await?;
        let written = self.upsert(fixtures).await;
        self.refreshed_at.write().await.insert(date, now);
        info!(%date, written, remaining = self.quota.remaining(), "Fixture catalog refreshed");
        Ok(written)
    }
}
