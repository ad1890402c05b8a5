//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::errors::{BotError, Result};

/// Largest page the TCGplayer pricing endpoint accepts
pub const MAX_TCGPLAYER_BATCH_SIZE: usize = 250;

/// Longest accepted price freshness window (ten years)
pub const MAX_FRESHNESS_HOURS: u64 = 24 * 365 * 10;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Messaging platform settings (consumed by the gateway layer)
    #[serde(default)]
    pub discord: DiscordConfig,
    /// TCGplayer pricing provider configuration
    #[serde(default)]
    pub tcgplayer: TcgPlayerConfig,
    /// Local card catalog source
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Rules FAQ source
    #[serde(default)]
    pub faq: FaqConfig,
    /// Price cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Query response settings
    #[serde(default)]
    pub query: QueryConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Reject settings the core cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.tcgplayer.batch_size == 0 {
            return Err(BotError::Configuration(
                "tcgplayer.batch_size must be at least 1".to_string(),
            ));
        }
        if self.tcgplayer.max_attempts == 0 {
            return Err(BotError::Configuration(
                "tcgplayer.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.query.max_results == 0 {
            return Err(BotError::Configuration(
                "query.max_results must be at least 1".to_string(),
            ));
        }
        if self.cache.freshness_hours > MAX_FRESHNESS_HOURS {
            return Err(BotError::Configuration(format!(
                "cache.freshness_hours must be at most {}",
                MAX_FRESHNESS_HOURS
            )));
        }
        if self.catalog.path.trim().is_empty() {
            return Err(BotError::Configuration(
                "catalog.path must not be empty".to_string(),
            ));
        }
        if self.faq.path.trim().is_empty() {
            return Err(BotError::Configuration(
                "faq.path must not be empty".to_string(),
            ));
        }
        url::Url::parse(&self.tcgplayer.base_url).map_err(|e| {
            BotError::Configuration(format!(
                "invalid tcgplayer.base_url '{}': {}",
                self.tcgplayer.base_url, e
            ))
        })?;
        Ok(())
    }
}

/// Messaging platform configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token for the gateway connection
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// TCGplayer platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcgPlayerConfig {
    /// Public key (client id) for the token endpoint
    #[serde(default)]
    pub public_key: Option<String>,
    /// Private key (client secret) for the token endpoint
    #[serde(default)]
    pub private_key: Option<String>,
    /// Base URL for the TCGplayer REST API
    #[serde(default = "default_tcgplayer_url")]
    pub base_url: String,
    /// Number of product ids per pricing request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential backoff in milliseconds
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
    /// Upper bound on a provider-requested Retry-After wait
    #[serde(default = "default_max_retry_after")]
    pub max_retry_after_seconds: u64,
}

impl Default for TcgPlayerConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            private_key: None,
            base_url: default_tcgplayer_url(),
            batch_size: default_batch_size(),
            request_timeout_seconds: default_request_timeout(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            max_retry_after_seconds: default_max_retry_after(),
        }
    }
}

impl TcgPlayerConfig {
    /// Credentials, if both halves are configured
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.public_key, &self.private_key) {
            (Some(public), Some(private)) if !public.is_empty() && !private.is_empty() => {
                Some(ApiCredentials::new(public.clone(), private.clone()))
            }
            _ => None,
        }
    }

    /// Batch size clamped to what the provider accepts
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_TCGPLAYER_BATCH_SIZE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_tcgplayer_url() -> String {
    "https://api.tcgplayer.com".to_string()
}

fn default_batch_size() -> usize {
    MAX_TCGPLAYER_BATCH_SIZE
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    500
}

fn default_max_retry_after() -> u64 {
    60
}

/// Card catalog source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the catalog JSON file
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> String {
    "data/cards.json".to_string()
}

/// Rules FAQ source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqConfig {
    /// Path to the FAQ JSON file; a missing file leaves `/faq` empty
    #[serde(default = "default_faq_path")]
    pub path: String,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            path: default_faq_path(),
        }
    }
}

fn default_faq_path() -> String {
    "data/faq.json".to_string()
}

/// Price cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age in hours after which a cached price is stale
    #[serde(default = "default_freshness_hours")]
    pub freshness_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_hours: default_freshness_hours(),
        }
    }
}

impl CacheConfig {
    /// Freshness window, clamped to `MAX_FRESHNESS_HOURS`
    pub fn freshness(&self) -> chrono::Duration {
        let hours = self.freshness_hours.min(MAX_FRESHNESS_HOURS);
        chrono::Duration::hours(hours as i64)
    }
}

fn default_freshness_hours() -> u64 {
    24
}

/// Query response configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum number of results returned for one query
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

fn default_max_results() -> usize {
    25
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AppSettings {
    /// Tracing level from `override_level` or the configured `log_level`
    ///
    /// Unknown names fall back to INFO.
    pub fn max_level(&self, override_level: Option<&str>) -> tracing::Level {
        match override_level
            .unwrap_or(&self.log_level)
            .trim()
            .to_lowercase()
            .as_str()
        {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// API credentials for the TCGplayer token endpoint
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub public_key: String,
    pub private_key: String,
}

impl ApiCredentials {
    pub fn new(public_key: String, private_key: String) -> Self {
        Self {
            public_key,
            private_key,
        }
    }
}
