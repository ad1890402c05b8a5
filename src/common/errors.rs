//! Error types for the bot core

use std::collections::HashMap;
use thiserror::Error;

use crate::common::types::PriceSnapshot;

/// Result type alias using our BotError
pub type Result<T> = std::result::Result<T, BotError>;

/// Main error type for catalog, pricing and query operations
#[derive(Error, Debug)]
pub enum BotError {
    /// The card catalog could not be loaded; fatal at startup
    #[error("Catalog load error: {0}")]
    CatalogLoad(String),

    /// The FAQ file is present but unusable
    #[error("FAQ load error: {0}")]
    FaqLoad(String),

    /// Price data could not be retrieved after retries
    #[error("Price fetch error: {0}")]
    PriceFetch(String),

    /// A bulk fetch stopped part way; `prices` holds what was gathered
    #[error("Partial price fetch ({} prices gathered): {message}", .prices.len())]
    PartialPriceFetch {
        message: String,
        prices: HashMap<String, PriceSnapshot>,
    },

    /// Rate limiting signal from the pricing provider
    #[error("Rate limit exceeded: {message}, retry after {retry_after_seconds:?} seconds")]
    RateLimit {
        message: String,
        retry_after_seconds: Option<u64>,
    },

    /// Unknown card or no price for it
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// File system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Server-side failure reported by the provider (5xx)
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// Whether a retry may succeed where this attempt failed
    pub fn is_retryable(&self) -> bool {
        match self {
            BotError::RateLimit { .. }
            | BotError::Timeout(_)
            | BotError::ProviderUnavailable(_) => true,
            BotError::HttpRequest(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().map(|s| s.is_server_error()).unwrap_or(false)
            }
            _ => false,
        }
    }

    /// Whether this is the expected "no such card / no price" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, BotError::NotFound(_))
    }
}
