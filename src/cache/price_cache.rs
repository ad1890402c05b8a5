//! In-memory price cache
//!
//! Uses `DashMap` so concurrent readers never wait on writers to other keys.
//! Entries are only ever replaced, never removed.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::catalog::CardCatalog;
use crate::common::types::PriceSnapshot;

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub stale: usize,
}

/// Process-lifetime store of the latest price per card id
#[derive(Debug)]
pub struct PriceCache {
    entries: DashMap<String, PriceSnapshot>,
    freshness: Duration,
    /// Accepted card ids; `None` accepts any id
    known_ids: Option<HashSet<String>>,
}

impl PriceCache {
    /// Create a cache that accepts any card id
    pub fn new(freshness: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            freshness,
            known_ids: None,
        }
    }

    /// Create a cache that only stores prices for cards in `catalog`
    pub fn for_catalog(catalog: &CardCatalog, freshness: Duration) -> Self {
        let known_ids = catalog.iter().map(|card| card.id.clone()).collect();
        Self {
            entries: DashMap::with_capacity(catalog.len()),
            freshness,
            known_ids: Some(known_ids),
        }
    }

    /// Look up the current snapshot for a card
    pub fn get(&self, id: &str) -> Option<PriceSnapshot> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// Store a snapshot, replacing any previous one
    ///
    /// Returns false if the id is not a known card and the snapshot was
    /// dropped.
    pub fn put(&self, id: &str, mut snapshot: PriceSnapshot) -> bool {
        if !self.accepts(id) {
            debug!("Dropping price for unknown card {}", id);
            return false;
        }
        if snapshot.card_id != id {
            snapshot.card_id = id.to_string();
        }
        self.entries.insert(id.to_string(), snapshot);
        true
    }

    /// Bulk insert, overwriting existing entries; returns how many were stored
    pub fn warm(&self, prices: HashMap<String, PriceSnapshot>) -> usize {
        let offered = prices.len();
        let stored = prices
            .into_iter()
            .map(|(id, snapshot)| self.put(&id, snapshot))
            .filter(|stored| *stored)
            .count();

        info!(
            stored,
            dropped = offered - stored,
            "Warmed price cache"
        );
        stored
    }

    /// Whether `snapshot` is older than the freshness window
    pub fn is_stale(&self, snapshot: &PriceSnapshot) -> bool {
        self.is_stale_at(snapshot, Utc::now())
    }

    pub fn is_stale_at(&self, snapshot: &PriceSnapshot, now: DateTime<Utc>) -> bool {
        now - snapshot.retrieved_at > self.freshness
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count entries and stale entries
    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let mut stats = CacheStats::default();
        for entry in self.entries.iter() {
            stats.entries += 1;
            if self.is_stale_at(entry.value(), now) {
                stats.stale += 1;
            }
        }
        stats
    }

    fn accepts(&self, id: &str) -> bool {
        self.known_ids
            .as_ref()
            .map(|ids| ids.contains(id))
            .unwrap_or(true)
    }
}
