//! Shared card and price types used across the catalog, cache and query layers

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single card from the catalog
///
/// Immutable once loaded. The catalog owns every `Card`; query results carry
/// clones of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique catalog identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Set / edition the card was printed in
    pub set: String,
    /// Card type or category (Minion, Magic, Site, ...)
    #[serde(rename = "type", alias = "card_type")]
    pub card_type: String,
    /// Rarity, if the dataset carries it
    #[serde(default)]
    pub rarity: Option<String>,
    /// The pricing provider's product id, when it differs from `id`
    #[serde(default, alias = "tcgplayer_id")]
    pub provider_id: Option<String>,
}

impl Card {
    /// Create a card with no rarity and no provider mapping
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        set: impl Into<String>,
        card_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            set: set.into(),
            card_type: card_type.into(),
            rarity: None,
            provider_id: None,
        }
    }

    /// Attach the provider's product id
    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Attach a rarity
    pub fn with_rarity(mut self, rarity: impl Into<String>) -> Self {
        self.rarity = Some(rarity.into());
        self
    }
}

/// Most recently fetched price for one card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Catalog id of the priced card
    pub card_id: String,
    /// Price value
    pub value: Decimal,
    /// ISO currency code
    pub currency: String,
    /// When the price was retrieved from the provider
    pub retrieved_at: DateTime<Utc>,
    /// Provider that produced the price
    pub source: String,
}

impl PriceSnapshot {
    /// Create a snapshot stamped with the current time
    pub fn new(
        card_id: impl Into<String>,
        value: Decimal,
        currency: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self::at(card_id, value, currency, source, Utc::now())
    }

    /// Create a snapshot with an explicit retrieval time
    pub fn at(
        card_id: impl Into<String>,
        value: Decimal,
        currency: impl Into<String>,
        source: impl Into<String>,
        retrieved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            card_id: card_id.into(),
            value,
            currency: currency.into(),
            retrieved_at,
            source: source.into(),
        }
    }
}

impl std::fmt::Display for PriceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.currency == "USD" {
            write!(f, "${:.2} USD", self.value)
        } else {
            write!(f, "{:.2} {}", self.value, self.currency)
        }
    }
}

/// Price attached to a query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PriceStatus {
    Available(PriceSnapshot),
    Unavailable,
}

impl PriceStatus {
    /// Get the snapshot if a price is attached
    pub fn snapshot(&self) -> Option<&PriceSnapshot> {
        match self {
            PriceStatus::Available(snapshot) => Some(snapshot),
            PriceStatus::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PriceStatus::Available(_))
    }
}

/// How a card matched the user's input, most relevant first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Prefix,
    Fuzzy,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::Prefix => write!(f, "prefix"),
            MatchKind::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// One entry of a query response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardResult {
    /// The matched card
    pub card: Card,
    /// Attached price, or `Unavailable` if it could not be obtained
    pub price: PriceStatus,
    /// Relevance class of the match
    pub match_kind: MatchKind,
    /// Whether the attached price is older than the freshness window
    #[serde(default)]
    pub stale: bool,
}
