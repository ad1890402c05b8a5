//! REST client for TCGplayer market prices

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::auth::{apply_bearer, TokenManager};
use super::mapping::IdentifierMap;
use super::messages::{PricingResponse, ProductPrice};
use super::retry::RetryPolicy;
use crate::common::errors::{BotError, Result};
use crate::common::traits::PriceProvider;
use crate::common::types::PriceSnapshot;
use crate::config::types::TcgPlayerConfig;

/// Source name stamped on TCGplayer snapshots
pub const TCGPLAYER_SOURCE: &str = "tcgplayer";

/// Currency of TCGplayer market prices
pub const TCGPLAYER_CURRENCY: &str = "USD";

/// REST API client for TCGplayer pricing
#[derive(Debug, Clone)]
pub struct TcgPlayerClient {
    /// HTTP client (carries the request timeout)
    client: Client,
    /// Base URL for the REST API
    base_url: Url,
    /// Product ids per pricing request
    batch_size: usize,
    /// Backoff for transient failures and rate limits
    retry: RetryPolicy,
    /// Catalog id <-> product id mapping
    ids: Arc<IdentifierMap>,
    /// Bearer token cache, when credentials are configured
    auth: Option<Arc<TokenManager>>,
}

impl TcgPlayerClient {
    /// Create a client from configuration and the catalog's id mapping
    pub fn new(config: &TcgPlayerConfig, ids: IdentifierMap) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            BotError::Configuration(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BotError::Configuration(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("sorcery_bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BotError::Internal(e.to_string()))?;

        let auth = config
            .credentials()
            .map(|creds| Arc::new(TokenManager::new(creds, base_url.as_str())));

        Ok(Self {
            client,
            base_url,
            batch_size: config.effective_batch_size(),
            retry: RetryPolicy::from_config(config),
            ids: Arc::new(ids),
            auth,
        })
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn identifiers(&self) -> &IdentifierMap {
        &self.ids
    }

    /// Fetch raw prices for one page of product ids, with retries
    #[instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    pub async fn fetch_page(&self, product_ids: &[String]) -> Result<Vec<ProductPrice>> {
        let label = format!("pricing request for {} products", product_ids.len());
        self.retry
            .run(&label, |attempt| {
                debug!(attempt, "Requesting price page");
                self.request_page(product_ids)
            })
            .await
    }

    /// `{base}/pricing/product/{ids}`, with each id percent-encoded
    pub fn pricing_url(&self, product_ids: &[String]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                BotError::Configuration(format!("base URL '{}' cannot carry a path", self.base_url))
            })?;
            // `push` escapes `/`, `#`, `?`, `%` and spaces; commas stay literal
            segments
                .pop_if_empty()
                .push("pricing")
                .push("product")
                .push(&product_ids.join(","));
        }
        Ok(url)
    }

    /// One pricing request, classifying the response for the retry policy
    async fn request_page(&self, product_ids: &[String]) -> Result<Vec<ProductPrice>> {
        let url = self.pricing_url(product_ids)?;
        debug!("Fetching prices from: {}", url);

        let mut request = self.client.get(url);
        if let Some(auth) = &self.auth {
            let token = auth.bearer(&self.client).await?;
            request = apply_bearer(request, &token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BotError::Timeout(format!("pricing request: {}", e))
            } else {
                BotError::HttpRequest(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            let pricing: PricingResponse = response.json().await?;
            if !pricing.success && pricing.results.is_empty() && !pricing.errors.is_empty() {
                return Err(BotError::NotFound(pricing.errors.join("; ")));
            }
            return Ok(pricing.results);
        }

        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(BotError::RateLimit {
                message: format!("TCGplayer returned 429: {}", body),
                retry_after_seconds: retry_after,
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                if let Some(auth) = &self.auth {
                    auth.invalidate().await;
                }
                Err(BotError::Authentication(format!(
                    "TCGplayer returned status {}: {}",
                    status, body
                )))
            }
            StatusCode::NOT_FOUND => Err(BotError::NotFound(product_ids.join(","))),
            s if s.is_server_error() => Err(BotError::ProviderUnavailable(format!(
                "TCGplayer returned status {}: {}",
                s, body
            ))),
            s => Err(BotError::PriceFetch(format!(
                "TCGplayer returned status {}: {}",
                s, body
            ))),
        }
    }
}

#[async_trait]
impl PriceProvider for TcgPlayerClient {
    #[instrument(skip(self))]
    async fn fetch_all(&self) -> Result<HashMap<String, PriceSnapshot>> {
        let product_ids = self.ids.provider_ids();
        let pages = product_ids.chunks(self.batch_size.max(1));
        let page_count = pages.len();
        info!(
            "Fetching TCGplayer prices for {} products in {} pages",
            product_ids.len(),
            page_count
        );

        let retrieved_at = Utc::now();
        let mut snapshots = HashMap::with_capacity(product_ids.len());

        for (page, chunk) in pages.enumerate() {
            let results = match self.fetch_page(chunk).await {
                Ok(results) => results,
                // Nothing in this page is priced
                Err(BotError::NotFound(_)) => continue,
                Err(e) => {
                    warn!(
                        gathered = snapshots.len(),
                        "Price page {} of {} failed: {}",
                        page + 1,
                        page_count,
                        e
                    );
                    return Err(BotError::PartialPriceFetch {
                        message: format!("page {} of {} failed: {}", page + 1, page_count, e),
                        prices: snapshots,
                    });
                }
            };

            for (product_id, price) in best_prices(&results) {
                match self.ids.catalog_id(&product_id) {
                    Some(card_id) => {
                        snapshots.insert(card_id.to_string(), snapshot(card_id, &price, retrieved_at));
                    }
                    None => debug!("Dropping price for unmapped product {}", product_id),
                }
            }
        }

        info!("Fetched {} TCGplayer prices", snapshots.len());
        Ok(snapshots)
    }

    #[instrument(skip(self))]
    async fn fetch_one(&self, card_id: &str) -> Result<PriceSnapshot> {
        let product_id = self
            .ids
            .provider_id(card_id)
            .ok_or_else(|| BotError::NotFound(card_id.to_string()))?
            .to_string();

        let results = self.fetch_page(std::slice::from_ref(&product_id)).await?;

        best_prices(&results)
            .remove(&product_id)
            .map(|price| snapshot(card_id, &price, Utc::now()))
            .ok_or_else(|| BotError::NotFound(card_id.to_string()))
    }

    fn source_name(&self) -> &'static str {
        TCGPLAYER_SOURCE
    }
}

/// Pick one priced entry per product, preferring the Normal sub-type
fn best_prices(results: &[ProductPrice]) -> HashMap<String, ProductPrice> {
    let mut best: HashMap<String, ProductPrice> = HashMap::new();

    for price in results.iter().filter(|p| p.best_price().is_some()) {
        let key = price.product_id.to_string();
        let replace = match best.get(&key) {
            None => true,
            Some(current) => !current.is_preferred_sub_type() && price.is_preferred_sub_type(),
        };
        if replace {
            best.insert(key, price.clone());
        }
    }

    best
}

fn snapshot(card_id: &str, price: &ProductPrice, retrieved_at: DateTime<Utc>) -> PriceSnapshot {
    PriceSnapshot::at(
        card_id,
        price.best_price().unwrap_or_default(),
        TCGPLAYER_CURRENCY,
        TCGPLAYER_SOURCE,
        retrieved_at,
    )
}

/// Seconds from a `Retry-After` header; HTTP-date values are ignored
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
