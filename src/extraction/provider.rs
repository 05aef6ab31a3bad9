//! OCR/vision providers that turn a slip image into text or a match list

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::common::errors::{PipelineError, Result};
use crate::common::types::TextLine;
use crate::config::types::{ProviderConfig, ProviderKind};

/// Match entry as returned by a vision provider
///
/// Every field is optional; the parser coerces and defaults them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredMatch {
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    /// Combined "Home - Away" text, used when the sides are missing
    #[serde(default)]
    pub teams: Option<String>,
    #[serde(default)]
    pub bet_type: Option<String>,
    #[serde(default)]
    pub pick: Option<String>,
    /// Odds as a JSON string or number
    #[serde(default)]
    pub odds: Option<serde_json::Value>,
    /// `DD/MM/YY`
    #[serde(default)]
    pub match_date: Option<String>,
    /// `HH:MM`
    #[serde(default)]
    pub match_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredSummary {
    #[serde(default)]
    pub total_odds: Option<serde_json::Value>,
    #[serde(default)]
    pub possible_win: Option<serde_json::Value>,
}

/// Pre-structured slip produced by a vision provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredSlip {
    #[serde(default)]
    pub bet_code: Option<String>,
    #[serde(default)]
    pub matches: Vec<StructuredMatch>,
    #[serde(default)]
    pub summary: StructuredSummary,
}

/// What a provider hands to the parser
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutput {
    /// Raw OCR lines, parsed by line scan
    Lines(Vec<TextLine>),
    /// Match list, only coerced and defaulted
    Structured(StructuredSlip),
}

/// Wire envelope shared by every provider endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderResponse {
    pub success: bool,
    #[serde(default)]
    pub text_blocks: Option<Vec<TextLine>>,
    /// Vision output; older providers call this field `data`
    #[serde(default, alias = "data")]
    pub structured: Option<StructuredSlip>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProviderResponse {
    /// Turn the envelope into parser input, or the provider's failure
    pub fn into_output(self) -> Result<ProviderOutput> {
        if !self.success {
            return Err(PipelineError::ExtractionFailure(
                self.error
                    .unwrap_or_else(|| "provider reported failure".to_string()),
            ));
        }
        match (self.structured, self.text_blocks) {
            (Some(slip), _) => Ok(ProviderOutput::Structured(slip)),
            (None, Some(lines)) => Ok(ProviderOutput::Lines(lines)),
            (None, None) => Err(PipelineError::ExtractionFailure(
                "provider returned neither text blocks nor matches".to_string(),
            )),
        }
    }
}

/// Anything that can read a slip image
#[async_trait]
pub trait SlipImageReader: Send + Sync {
    async fn read(&self, image: &[u8]) -> Result<ProviderOutput>;

    /// Provider name, for logs
    fn name(&self) -> &'static str;
}

/// HTTP provider: POSTs the raw image and decodes the response envelope
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    kind: ProviderKind,
}

impl HttpProvider {
    pub fn new(endpoint: &str, kind: ProviderKind) -> Result<Self> {
        Self::with_timeout(endpoint, kind, Duration::from_secs(30))
    }

    pub fn with_timeout(endpoint: &str, kind: ProviderKind, timeout: Duration) -> Result<Self> {
        url::Url::parse(endpoint)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: None,
            kind,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl SlipImageReader for HttpProvider {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn read(&self, image: &[u8]) -> Result<ProviderOutput> {
        let mode = match self.kind {
            ProviderKind::Vision => "structured",
            _ => "lines",
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .query(&[("mode", mode)])
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::ExtractionFailure(format!("provider unreachable: {}", e)))?;
        if !response.status().is_success() {
            return Err(PipelineError::ExtractionFailure(format!(
                "provider returned status: {}",
                response.status()
            )));
        }

        let envelope: ProviderResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::ExtractionFailure(format!("unreadable provider response: {}", e)))?;
        debug!(success = envelope.success, "Provider responded");
        envelope.into_output()
    }

    fn name(&self) -> &'static str {
        match self.kind {
            ProviderKind::Vision => "vision",
            _ => "text_ocr",
        }
    }
}

/// Replays a saved provider response from disk, ignoring the image
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    path: PathBuf,
}

impl ReplayProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SlipImageReader for ReplayProvider {
    async fn read(&self, _image: &[u8]) -> Result<ProviderOutput> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let envelope: ProviderResponse = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::ExtractionFailure(format!("unreadable provider response: {}", e)))?;
        envelope.into_output()
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

/// Provider variant selected by configuration
#[derive(Debug, Clone)]
pub enum Provider {
    Http(HttpProvider),
    Replay(ReplayProvider),
}

impl Provider {
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config.kind {
            ProviderKind::Replay => {
                let path = config.replay_path.as_deref().ok_or_else(|| {
                    PipelineError::Configuration(
                        "replay provider needs provider.replay_path".to_string(),
                    )
                })?;
                info!(path, "Using replay provider");
                Ok(Self::Replay(ReplayProvider::new(path)))
            }
            kind => {
                let mut provider = HttpProvider::with_timeout(
                    &config.endpoint,
                    kind,
                    Duration::from_secs(config.request_timeout_seconds),
                )?;
                match &config.api_key {
                    Some(key) => provider = provider.with_api_key(key.clone()),
                    None => warn!(endpoint = %config.endpoint, "Provider has no API key"),
                }
                Ok(Self::Http(provider))
            }
        }
    }
}

#[async_trait]
impl SlipImageReader for Provider {
    async fn read(&self, image: &[u8]) -> Result<ProviderOutput> {
        match self {
            Self::Http(provider) => provider.read(image).await,
            Self::Replay(provider) => provider.read(image).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Http(provider) => provider.name(),
            Self::Replay(provider) => provider.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_structured_envelope_decodes() {
        let raw = r#"{
            "success": true,
            "data": {
                "matches": [
                    {"home_team": "Arsenal", "away_team": "Chelsea", "bet_type": "3 Way",
                     "pick": "Home", "odds": 1.5, "match_date": "12/10/24", "match_time": "19:45"}
                ],
                "summary": {"total_odds": "1.50"}
            }
        }"#;
        let envelope: ProviderResponse = serde_json::from_str(raw).unwrap();
        match envelope.into_output().unwrap() {
            ProviderOutput::Structured(slip) => {
                assert_eq!(slip.matches.len(), 1);
                assert_eq!(slip.matches[0].pick.as_deref(), Some("Home"));
                assert_eq!(slip.summary.total_odds, Some(serde_json::json!("1.50")));
            }
            other => panic!("expected structured output, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_envelope_is_an_error() {
        let envelope: ProviderResponse =
            serde_json::from_str(r#"{"success": false, "error": "API Timeout/RateLimit"}"#).unwrap();
        let err = envelope.into_output().unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailure(msg) if msg.contains("RateLimit")));
    }

    #[test]
    fn test_replay_requires_path() {
        let config = ProviderConfig {
            kind: ProviderKind::Replay,
            ..Default::default()
        };
        assert!(matches!(
            Provider::from_config(&config),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_http_provider_posts_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract"))
            .and(query_param("mode", "lines"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "text_blocks": [
                    {"text": "Arsenal - Chelsea", "confidence": 98.0},
                    {"text": "1.85", "confidence": 91.5}
                ]
            })))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&format!("{}/extract", server.uri()), ProviderKind::TextOcr)
            .unwrap()
            .with_api_key("secret");
        let output = provider.read(b"\x89PNG").await.unwrap();

        assert_eq!(
            output,
            ProviderOutput::Lines(vec![
                TextLine::new("Arsenal - Chelsea", 98.0),
                TextLine::new("1.85", 91.5),
            ])
        );
    }

    #[tokio::test]
    async fn test_http_provider_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&server.uri(), ProviderKind::Vision).unwrap();
        let err = provider.read(b"img").await.unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailure(_)));
    }

    #[tokio::test]
    async fn test_http_provider_malformed_body_is_extraction_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(&server.uri(), ProviderKind::TextOcr).unwrap();
        let err = provider.read(b"img").await.unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailure(msg) if msg.contains("unreadable")));
    }

    #[tokio::test]
    async fn test_http_provider_unreachable_is_extraction_failure() {
        // nothing listens on the discard port
        let provider = HttpProvider::new("http://127.0.0.1:9/extract", ProviderKind::TextOcr).unwrap();
        let err = provider.read(b"img").await.unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFailure(msg) if msg.contains("unreachable")));
    }
}
