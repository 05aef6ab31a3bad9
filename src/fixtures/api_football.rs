//! REST client for the API-Football fixture feed

use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::messages::FixturesResponse;
use crate::common::errors::{PipelineError, Result};
use crate::common::types::Fixture;
use crate::config::types::FixtureFeedConfig;

const API_KEY_HEADER: &str = "x-apisports-key";

/// REST client for the fixture feed
#[derive(Debug, Clone)]
pub struct ApiFootballClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiFootballClient {
    /// Create a new client (unauthenticated)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        url::Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        })
    }

    pub fn from_config(config: &FixtureFeedConfig) -> Result<Self> {
        let client = Self::with_timeout(
            &config.base_url,
            Duration::from_secs(config.request_timeout_seconds),
        )?;
        Ok(match &config.api_key {
            Some(key) => client.with_api_key(key.clone()),
            None => client,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// All fixtures scheduled on one day. Costs one request of quota.
    #[instrument(skip(self))]
    pub async fn fixtures_on(&self, date: NaiveDate) -> Result<Vec<Fixture>> {
        let url = format!("{}/fixtures", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("date", date.format("%Y-%m-%d").to_string())]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::InvalidResponse(format!(
                "Fixture feed returned status: {}",
                response.status()
            )));
        }

        let body: FixturesResponse = response.json().await?;
        if let Some(message) = body.error_message() {
            return Err(PipelineError::InvalidResponse(message));
        }

        let total = body.response.len();
        let fixtures: Vec<Fixture> = body
            .response
            .into_iter()
            .filter_map(|entry| entry.into_fixture())
            .collect();
        if fixtures.len() < total {
            warn!(skipped = total - fixtures.len(), "Fixtures with unknown status skipped");
        }
        debug!(count = fixtures.len(), "Fetched fixtures");
        Ok(fixtures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            ApiFootballClient::new("not a url"),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = ApiFootballClient::new("https://v3.football.api-sports.io/").unwrap();
        assert_eq!(client.base_url, "https://v3.football.api-sports.io");
    }
}
