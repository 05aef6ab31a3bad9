//! HTTP client for the livescore JSON feed

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::messages::LivescoreResponse;
use crate::common::errors::{PipelineError, Result};
use crate::common::traits::LivescoreSource;
use crate::common::types::LivescoreMatch;
use crate::config::types::LivescoreConfig;

/// Livescore collector speaking to a scoreboard feed
#[derive(Debug, Clone)]
pub struct LivescoreClient {
    client: Client,
    base_url: String,
}

impl LivescoreClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        url::Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &LivescoreConfig) -> Result<Self> {
        Self::with_timeout(
            &config.base_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }
}

#[async_trait]
impl LivescoreSource for LivescoreClient {
    #[instrument(skip(self))]
    async fn scrape(&self, date: NaiveDate) -> Result<Vec<LivescoreMatch>> {
        let url = format!("{}/{}", self.base_url, date.format("%Y-%m-%d"));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::InvalidResponse(format!(
                "Livescore feed returned status: {}",
                response.status()
            )));
        }

        let body: LivescoreResponse = response.json().await?;
        let matches: Vec<LivescoreMatch> = body
            .matches
            .into_iter()
            .filter_map(|entry| entry.into_match())
            .collect();

        let finished = matches.iter().filter(|m| m.is_finished).count();
        debug!(url = %url, "Livescore feed read");
        info!(total = matches.len(), finished, "Scraped livescore matches");
        Ok(matches)
    }

    fn source_name(&self) -> &'static str {
        "livescore"
    }
}
