//! Name index over the card catalog
//!
//! Built once from the catalog's cards (or any named records, such as FAQ
//! topics) and read-only afterwards. Resolution
//! order is exact, then prefix, then fuzzy; within a class, matches keep the
//! catalog's insertion order.

use std::collections::HashMap;

use super::normalize::normalize;
use crate::common::types::{Card, MatchKind};

/// One index entry, one per catalog card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Normalized card name
    pub key: String,
    /// Position of the card in catalog insertion order
    pub position: usize,
}

/// A resolved match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMatch {
    pub position: usize,
    pub kind: MatchKind,
}

/// Read-only lookup structure keyed by normalized card name
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<IndexEntry>,
    by_name: HashMap<String, Vec<usize>>,
}

impl CatalogIndex {
    /// Build the index from cards in insertion order
    pub fn build(cards: &[Card]) -> Self {
        Self::from_names(cards.iter().enumerate().map(|(position, card)| (position, &card.name)))
    }

    /// Build the index from `(position, name)` pairs
    ///
    /// Several names may share a position; matches report the position.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();

        for (position, name) in names {
            let key = normalize(name.as_ref());
            by_name.entry(key.clone()).or_default().push(position);
            entries.push(IndexEntry { key, position });
        }

        Self { entries, by_name }
    }

    /// Number of entries (equals the number of cards for a card index)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Positions of cards whose normalized name equals `key`
    pub fn exact(&self, key: &str) -> &[usize] {
        self.by_name.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve already-normalized input to at most `limit` matches
    ///
    /// Only the most relevant non-empty class is returned: an exact hit
    /// suppresses prefix and fuzzy hits.
    pub fn search(&self, normalized: &str, limit: usize) -> Vec<IndexMatch> {
        if normalized.is_empty() || limit == 0 {
            return Vec::new();
        }

        let exact = self.exact(normalized);
        if !exact.is_empty() {
            return exact
                .iter()
                .take(limit)
                .map(|&position| IndexMatch {
                    position,
                    kind: MatchKind::Exact,
                })
                .collect();
        }

        let prefix = self.collect(limit, MatchKind::Prefix, |key| key.starts_with(normalized));
        if !prefix.is_empty() {
            return prefix;
        }

        let tokens: Vec<&str> = normalized.split(' ').collect();
        self.collect(limit, MatchKind::Fuzzy, |key| {
            key.contains(normalized) || (tokens.len() > 1 && tokens.iter().all(|t| key.contains(*t)))
        })
    }

    fn collect<F>(&self, limit: usize, kind: MatchKind, predicate: F) -> Vec<IndexMatch>
    where
        F: Fn(&str) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| predicate(entry.key.as_str()))
            .take(limit)
            .map(|entry| IndexMatch {
                position: entry.position,
                kind,
            })
            .collect()
    }
}
