//! Common test utilities and fixtures

#![allow(dead_code)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sorcery_bot::{Card, CardCatalog, PriceSnapshot};

/// Small catalog with one duplicated name across sets
pub fn sample_cards() -> Vec<Card> {
    vec![
        Card::new("C1", "Avatar of the Fox", "Alpha", "Avatar").with_provider_id("510001"),
        Card::new("C2", "Apprentice Wizard", "Alpha", "Minion")
            .with_provider_id("510002")
            .with_rarity("Ordinary"),
        Card::new("C3", "Pit Vipers", "Beta", "Minion").with_provider_id("510003"),
        Card::new("C4", "Apprentice Wizard", "Beta", "Minion").with_provider_id("510004"),
        Card::new("C5", "Philosopher's Stone", "Arthurian Legends", "Artifact"),
    ]
}

pub fn sample_catalog() -> CardCatalog {
    CardCatalog::from_cards(sample_cards()).expect("sample catalog is valid")
}

/// Catalog with exactly the card from the worked example
pub fn fox_catalog() -> CardCatalog {
    CardCatalog::from_cards(vec![Card::new("C1", "Avatar of the Fox", "Alpha", "Avatar")])
        .expect("fox catalog is valid")
}

pub fn usd(card_id: &str, value: Decimal) -> PriceSnapshot {
    PriceSnapshot::new(card_id, value, "USD", "tcgplayer")
}

pub fn fox_price() -> PriceSnapshot {
    usd("C1", dec!(2.50))
}

/// Sample TCGplayer API responses
pub mod api_responses {
    use serde_json::{json, Value};

    /// One result entry in the pricing response
    pub fn price_entry(product_id: u64, sub_type: &str, market: Option<f64>) -> Value {
        json!({
            "productId": product_id,
            "lowPrice": market,
            "midPrice": market,
            "highPrice": market,
            "marketPrice": market,
            "directLowPrice": null,
            "subTypeName": sub_type
        })
    }

    pub fn pricing(results: Vec<Value>) -> Value {
        json!({
            "success": true,
            "errors": [],
            "results": results
        })
    }

    pub fn pricing_not_found() -> Value {
        json!({
            "success": false,
            "errors": ["No products were found."],
            "results": []
        })
    }

    pub fn token(access_token: &str) -> Value {
        json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 1209599,
            "userName": "bot"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.index().len(), 5);
    }

    #[test]
    fn test_fox_price() {
        let price = fox_price();
        assert_eq!(price.card_id, "C1");
        assert_eq!(price.value, dec!(2.50));
    }
}
