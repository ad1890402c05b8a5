//! Card catalog loading and lookup

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

use super::index::CatalogIndex;
use crate::common::errors::{BotError, Result};
use crate::common::types::Card;

/// Versioned catalog file layout
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    version: Option<String>,
    cards: Vec<Card>,
}

/// Either a bare list of cards or the versioned wrapper
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogSource {
    Versioned(CatalogFile),
    Bare(Vec<Card>),
}

/// The canonical, read-only set of cards
///
/// Holds cards in insertion order, an id lookup table and the name index.
/// Nothing here changes after construction.
#[derive(Debug, Clone)]
pub struct CardCatalog {
    cards: Vec<Card>,
    by_id: HashMap<String, usize>,
    index: CatalogIndex,
    version: Option<String>,
}

impl CardCatalog {
    /// Load the catalog from a JSON file
    ///
    /// Fails with `BotError::CatalogLoad` when the file is missing, cannot be
    /// parsed, or contains a duplicate or empty card id.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BotError::CatalogLoad(format!("cannot read {}: {}", path.display(), e))
        })?;

        let catalog = Self::from_json(&raw).map_err(|e| match e {
            BotError::CatalogLoad(reason) => {
                BotError::CatalogLoad(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })?;

        info!(
            "Loaded {} cards from {} (version: {})",
            catalog.len(),
            path.display(),
            catalog.version.as_deref().unwrap_or("unversioned")
        );
        Ok(catalog)
    }

    /// Parse a catalog from JSON text
    pub fn from_json(raw: &str) -> Result<Self> {
        let source: CatalogSource = serde_json::from_str(raw)
            .map_err(|e| BotError::CatalogLoad(format!("malformed catalog: {}", e)))?;

        match source {
            CatalogSource::Versioned(file) => {
                let mut catalog = Self::from_cards(file.cards)?;
                catalog.version = file.version;
                Ok(catalog)
            }
            CatalogSource::Bare(cards) => Self::from_cards(cards),
        }
    }

    /// Build a catalog from cards, validating identifier uniqueness
    pub fn from_cards(cards: Vec<Card>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(cards.len());

        for (position, card) in cards.iter().enumerate() {
            if card.id.trim().is_empty() {
                return Err(BotError::CatalogLoad(format!(
                    "card '{}' at position {} has an empty id",
                    card.name, position
                )));
            }
            if by_id.insert(card.id.clone(), position).is_some() {
                return Err(BotError::CatalogLoad(format!(
                    "duplicate card id '{}'",
                    card.id
                )));
            }
        }

        let index = CatalogIndex::build(&cards);
        debug!("Built catalog index with {} entries", index.len());

        Ok(Self {
            cards,
            by_id,
            index,
            version: None,
        })
    }

    /// Look up a card by its catalog id
    pub fn lookup_by_id(&self, id: &str) -> Option<&Card> {
        self.by_id.get(id).map(|&position| &self.cards[position])
    }

    /// Whether a card with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Card at an index position
    pub fn get(&self, position: usize) -> Option<&Card> {
        self.cards.get(position)
    }

    /// Iterate over cards in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Dataset version, if the file declared one
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
