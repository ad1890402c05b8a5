//! Catalog id to provider product id mapping

use std::collections::HashMap;
use tracing::warn;

use crate::catalog::CardCatalog;

/// Two-way mapping between catalog card ids and provider product ids
///
/// Cards without an explicit `provider_id` map to their own catalog id.
#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    to_provider: HashMap<String, String>,
    to_catalog: HashMap<String, String>,
    /// Provider ids in catalog order, without duplicates
    provider_ids: Vec<String>,
}

impl IdentifierMap {
    /// Build the mapping from every card in the catalog
    pub fn from_catalog(catalog: &CardCatalog) -> Self {
        Self::from_pairs(catalog.iter().map(|card| {
            let provider_id = card.provider_id.clone().unwrap_or_else(|| card.id.clone());
            (card.id.clone(), provider_id)
        }))
    }

    /// Build the mapping from `(catalog_id, provider_id)` pairs
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut map = Self::default();
        for (catalog_id, provider_id) in pairs {
            if let Some(existing) = map.to_catalog.get(&provider_id) {
                warn!(
                    "Provider id {} is shared by cards {} and {}; prices go to {}",
                    provider_id, existing, catalog_id, existing
                );
            } else {
                map.to_catalog.insert(provider_id.clone(), catalog_id.clone());
                map.provider_ids.push(provider_id.clone());
            }
            map.to_provider.insert(catalog_id, provider_id);
        }
        map
    }

    /// Provider product id for a catalog card id
    pub fn provider_id(&self, catalog_id: &str) -> Option<&str> {
        self.to_provider.get(catalog_id).map(String::as_str)
    }

    /// Catalog card id for a provider product id
    pub fn catalog_id(&self, provider_id: &str) -> Option<&str> {
        self.to_catalog.get(provider_id).map(String::as_str)
    }

    /// Distinct provider ids in catalog order
    pub fn provider_ids(&self) -> &[String] {
        &self.provider_ids
    }

    pub fn len(&self) -> usize {
        self.to_provider.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_provider.is_empty()
    }
}
