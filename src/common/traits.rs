//! Trait definitions for price providers

use async_trait::async_trait;
use std::collections::HashMap;

use super::errors::Result;
use super::types::PriceSnapshot;

/// Trait for remote pricing services (TCGplayer, test doubles, ...)
///
/// All identifiers are catalog card ids. Implementations translate them to
/// their own product ids internally.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch prices for every priceable card in one logical operation
    ///
    /// Pages through the provider as needed and aggregates the result,
    /// keyed by catalog card id. If a page fails after others succeeded,
    /// returns `BotError::PartialPriceFetch` carrying the prices gathered.
    async fn fetch_all(&self) -> Result<HashMap<String, PriceSnapshot>>;

    /// Fetch the price of a single card
    ///
    /// Returns `BotError::NotFound` for an unknown id or a card without price.
    async fn fetch_one(&self, card_id: &str) -> Result<PriceSnapshot>;

    /// Name of the pricing source, stamped on snapshots
    fn source_name(&self) -> &'static str;
}
