//! Card query façade used by the command handlers

use dashmap::DashSet;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::cache::PriceCache;
use crate::catalog::{normalize, CardCatalog};
use crate::common::errors::Result;
use crate::common::traits::PriceProvider;
use crate::common::types::{Card, CardResult, MatchKind, PriceSnapshot, PriceStatus};

/// Default cap on results per query
pub const DEFAULT_MAX_RESULTS: usize = 25;

/// Resolves user input against the catalog and attaches cached prices
///
/// Cloning is cheap: every field is shared. Safe to call from many tasks at
/// once; the price cache is the only shared mutable state.
#[derive(Clone)]
pub struct CardQueryService {
    catalog: Arc<CardCatalog>,
    cache: Arc<PriceCache>,
    provider: Arc<dyn PriceProvider>,
    max_results: usize,
    /// Card ids with a background refresh in flight
    refreshing: Arc<DashSet<String>>,
}

impl CardQueryService {
    pub fn new(
        catalog: Arc<CardCatalog>,
        cache: Arc<PriceCache>,
        provider: Arc<dyn PriceProvider>,
        max_results: usize,
    ) -> Self {
        Self {
            catalog,
            cache,
            provider,
            max_results: max_results.max(1),
            refreshing: Arc::new(DashSet::new()),
        }
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Find cards matching `input` and attach their prices
    ///
    /// Never fails: no match yields an empty list, and a card whose price
    /// cannot be obtained is returned with `PriceStatus::Unavailable`.
    #[instrument(skip(self))]
    pub async fn query(&self, input: &str) -> Vec<CardResult> {
        let normalized = normalize(input);
        let matches = self.catalog.index().search(&normalized, self.max_results);
        if matches.is_empty() {
            debug!("No catalog match for '{}'", input);
            return Vec::new();
        }

        let lookups = matches.into_iter().filter_map(|m| {
            self.catalog
                .get(m.position)
                .map(|card| self.resolve(card, m.kind))
        });

        // Misses are fetched concurrently; join_all keeps match order
        let results = join_all(lookups).await;
        debug!(
            count = results.len(),
            priced = results.iter().filter(|r| r.price.is_available()).count(),
            "Query resolved"
        );
        results
    }

    /// Look up a single card by catalog id
    #[instrument(skip(self))]
    pub async fn lookup(&self, card_id: &str) -> Option<CardResult> {
        let card = self.catalog.lookup_by_id(card_id)?;
        Some(self.resolve(card, MatchKind::Exact).await)
    }

    /// Fetch a fresh price for a card and store it
    #[instrument(skip(self))]
    pub async fn refresh(&self, card_id: &str) -> Result<PriceSnapshot> {
        let snapshot = self.provider.fetch_one(card_id).await?;
        self.cache.put(card_id, snapshot.clone());
        Ok(snapshot)
    }

    /// Refresh a card's price in the background
    ///
    /// Returns `None` if a refresh for this card is already running.
    pub fn schedule_refresh(&self, card_id: &str) -> Option<JoinHandle<()>> {
        if !self.refreshing.insert(card_id.to_string()) {
            debug!("Refresh already in flight for {}", card_id);
            return None;
        }

        info!("Scheduling background price refresh for {}", card_id);
        let guard = InFlight {
            set: self.refreshing.clone(),
            card_id: card_id.to_string(),
        };
        let service = self.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = service.refresh(&guard.card_id).await {
                warn!("Background refresh for {} failed: {}", guard.card_id, e);
            }
        }))
    }

    /// Number of background refreshes currently running
    pub fn refreshes_in_flight(&self) -> usize {
        self.refreshing.len()
    }

    async fn resolve(&self, card: &Card, match_kind: MatchKind) -> CardResult {
        let (price, stale) = self.price_for(&card.id).await;
        CardResult {
            card: card.clone(),
            price,
            match_kind,
            stale,
        }
    }

    /// Read-through price lookup
    ///
    /// A stale hit is returned as-is and refreshed in the background; a miss
    /// is fetched before returning.
    async fn price_for(&self, card_id: &str) -> (PriceStatus, bool) {
        if let Some(snapshot) = self.cache.get(card_id) {
            let stale = self.cache.is_stale(&snapshot);
            if stale {
                self.schedule_refresh(card_id);
            }
            return (PriceStatus::Available(snapshot), stale);
        }

        match self.provider.fetch_one(card_id).await {
            Ok(snapshot) => {
                self.cache.put(card_id, snapshot.clone());
                (PriceStatus::Available(snapshot), false)
            }
            Err(e) if e.is_not_found() => {
                debug!("No price available for {}", card_id);
                (PriceStatus::Unavailable, false)
            }
            Err(e) => {
                warn!("Price fetch for {} failed: {}", card_id, e);
                (PriceStatus::Unavailable, false)
            }
        }
    }
}

/// Clears a card's in-flight marker when its refresh task ends, even by panic
struct InFlight {
    set: Arc<DashSet<String>>,
    card_id: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.remove(&self.card_id);
    }
}

impl std::fmt::Debug for CardQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardQueryService")
            .field("cards", &self.catalog.len())
            .field("cached_prices", &self.cache.len())
            .field("provider", &self.provider.source_name())
            .field("max_results", &self.max_results)
            .finish()
    }
}
