//! Configuration types

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// OCR/vision provider selection
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Fixture catalog feed
    #[serde(default)]
    pub fixtures: FixtureFeedConfig,
    /// Livescore feed used by the settlement job
    #[serde(default)]
    pub livescore: LivescoreConfig,
    /// Fuzzy matching thresholds
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Odds cross-check settings
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Background extraction workers
    #[serde(default)]
    pub workers: WorkerConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Which provider variant turns images into text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Line OCR service returning `text_blocks`
    #[default]
    TextOcr,
    /// Vision model returning a pre-structured match list
    Vision,
    /// Saved provider response read from disk
    Replay,
}

/// OCR/vision provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    /// Endpoint the image is POSTed to
    #[serde(default = "default_provider_endpoint")]
    pub endpoint: String,
    /// Bearer token for the provider
    #[serde(default)]
    pub api_key: Option<String>,
    /// File read by the replay provider
    #[serde(default)]
    pub replay_path: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            endpoint: default_provider_endpoint(),
            api_key: None,
            replay_path: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_provider_endpoint() -> String {
    "http://localhost:8090/extract".to_string()
}

/// Fixture feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureFeedConfig {
    /// Base URL of the fixture API
    #[serde(default = "default_fixtures_url")]
    pub base_url: String,
    /// API key sent with every request
    #[serde(default)]
    pub api_key: Option<String>,
    /// Requests allowed per UTC day
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// Days ahead refreshed when no date hint is available
    #[serde(default = "default_refresh_days")]
    pub refresh_days: u32,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for FixtureFeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_fixtures_url(),
            api_key: None,
            daily_limit: default_daily_limit(),
            refresh_days: default_refresh_days(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_fixtures_url() -> String {
    "https://v3.football.api-sports.io".to_string()
}

fn default_daily_limit() -> u32 {
    100
}

fn default_refresh_days() -> u32 {
    7
}

/// Livescore feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivescoreConfig {
    /// Base URL of the livescore JSON feed
    #[serde(default = "default_livescore_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for LivescoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_livescore_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_livescore_url() -> String {
    "http://localhost:8091/football".to_string()
}

/// Fuzzy team matching thresholds, on a 0..=100 similarity scale
///
/// Empirical values; calibrate against labelled data before tightening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum per-team similarity when matching against the fixture catalog
    #[serde(default = "default_enrichment_threshold")]
    pub enrichment_threshold: f64,
    /// Per-team similarity a livescore entry must exceed
    #[serde(default = "default_settlement_team_threshold")]
    pub settlement_team_threshold: f64,
    /// Average similarity a livescore entry must exceed
    #[serde(default = "default_settlement_combined_threshold")]
    pub settlement_combined_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            enrichment_threshold: default_enrichment_threshold(),
            settlement_team_threshold: default_settlement_team_threshold(),
            settlement_combined_threshold: default_settlement_combined_threshold(),
        }
    }
}

fn default_enrichment_threshold() -> f64 {
    75.0
}

fn default_settlement_team_threshold() -> f64 {
    60.0
}

fn default_settlement_combined_threshold() -> f64 {
    70.0
}

/// Odds cross-check configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Relative tolerance between stated and recomputed total odds, in percent
    #[serde(default = "default_odds_tolerance_pct")]
    pub odds_tolerance_pct: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            odds_tolerance_pct: default_odds_tolerance_pct(),
        }
    }
}

fn default_odds_tolerance_pct() -> f64 {
    5.0
}

/// Background worker pool configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent extraction workers
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Maximum queued submissions before `submit` is rejected
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            queue_depth: default_queue_depth(),
        }
    }
}

fn default_pool_size() -> usize {
    3
}

fn default_queue_depth() -> usize {
    64
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Hours past kickoff after which a still-pending selection raises an alert
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: i64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stale_after_hours() -> i64 {
    24
}

fn default_request_timeout() -> u64 {
    30
}
