//! Static FAQ store
//!
//! Topics and aliases go through the same normalization and index as card
//! names, so `/faq` accepts the same loose input as `/card`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::catalog::{normalize, CatalogIndex};
use crate::common::errors::{BotError, Result};

/// One question and its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Name the entry is listed and looked up under
    pub topic: String,
    /// Other names that resolve to this entry
    #[serde(default)]
    pub aliases: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FaqSource {
    Wrapped { entries: Vec<FaqEntry> },
    Bare(Vec<FaqEntry>),
}

/// Read-only FAQ entries with a topic index
#[derive(Debug, Clone, Default)]
pub struct FaqRepository {
    entries: Vec<FaqEntry>,
    index: CatalogIndex,
}

impl FaqRepository {
    /// Repository with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load entries from a JSON file
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BotError::FaqLoad(format!("cannot read {}: {}", path.display(), e)))?;

        let faq = Self::from_json(&raw).map_err(|e| match e {
            BotError::FaqLoad(reason) => BotError::FaqLoad(format!("{}: {}", path.display(), reason)),
            other => other,
        })?;

        info!("Loaded {} FAQ entries from {}", faq.len(), path.display());
        Ok(faq)
    }

    /// Parse entries from JSON text: a list, or `{ "entries": [...] }`
    pub fn from_json(raw: &str) -> Result<Self> {
        let source: FaqSource = serde_json::from_str(raw)
            .map_err(|e| BotError::FaqLoad(format!("malformed FAQ: {}", e)))?;

        match source {
            FaqSource::Wrapped { entries } | FaqSource::Bare(entries) => Self::from_entries(entries),
        }
    }

    /// Build from entries, rejecting empty and duplicate topics
    pub fn from_entries(entries: Vec<FaqEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            let key = normalize(&entry.topic);
            if key.is_empty() {
                return Err(BotError::FaqLoad(format!(
                    "entry with answer '{}' has an empty topic",
                    entry.answer
                )));
            }
            if !seen.insert(key) {
                return Err(BotError::FaqLoad(format!("duplicate topic '{}'", entry.topic)));
            }
        }

        let index = CatalogIndex::from_names(entries.iter().enumerate().flat_map(|(position, entry)| {
            std::iter::once(entry.topic.as_str())
                .chain(entry.aliases.iter().map(String::as_str))
                .map(move |name| (position, name))
        }));
        debug!("Built FAQ index with {} keys", index.len());

        Ok(Self { entries, index })
    }

    /// Entries matching `input`, best match class first, at most `limit`
    pub fn lookup(&self, input: &str, limit: usize) -> Vec<&FaqEntry> {
        let normalized = normalize(input);
        // Topic and alias can both match; report each entry once
        let mut seen = HashSet::new();
        self.index
            .search(&normalized, usize::MAX)
            .into_iter()
            .filter(|m| seen.insert(m.position))
            .take(limit)
            .filter_map(|m| self.entries.get(m.position))
            .collect()
    }

    /// Topics in file order
    pub fn topics(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.topic.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
