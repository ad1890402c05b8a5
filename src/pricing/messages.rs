//! TCGplayer API message types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sub-type preferred when a product is priced in several printings
pub const PREFERRED_SUB_TYPE: &str = "Normal";

// ============================================================================
// Authentication
// ============================================================================

/// Response of `POST /token`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds
    pub expires_in: i64,
    #[serde(rename = "userName", default)]
    pub user_name: Option<String>,
}

// ============================================================================
// Pricing
// ============================================================================

/// Market prices for one product sub-type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPrice {
    pub product_id: u64,
    #[serde(default)]
    pub low_price: Option<Decimal>,
    #[serde(default)]
    pub mid_price: Option<Decimal>,
    #[serde(default)]
    pub high_price: Option<Decimal>,
    #[serde(default)]
    pub market_price: Option<Decimal>,
    #[serde(default)]
    pub direct_low_price: Option<Decimal>,
    #[serde(default)]
    pub sub_type_name: Option<String>,
}

impl ProductPrice {
    /// Best single price figure: market, then mid, then low
    pub fn best_price(&self) -> Option<Decimal> {
        self.market_price.or(self.mid_price).or(self.low_price)
    }

    pub fn is_preferred_sub_type(&self) -> bool {
        self.sub_type_name
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case(PREFERRED_SUB_TYPE))
            .unwrap_or(false)
    }
}

/// Response of `GET /pricing/product/{ids}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub results: Vec<ProductPrice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pricing_response_deserializes_with_nulls() {
        let json = r#"{
            "success": true,
            "errors": [],
            "results": [
                {
                    "productId": 510001,
                    "lowPrice": 1.99,
                    "midPrice": 2.75,
                    "highPrice": 9.99,
                    "marketPrice": 2.50,
                    "directLowPrice": null,
                    "subTypeName": "Normal"
                },
                {
                    "productId": 510001,
                    "lowPrice": null,
                    "midPrice": null,
                    "highPrice": null,
                    "marketPrice": null,
                    "directLowPrice": null,
                    "subTypeName": "Foil"
                }
            ]
        }"#;

        let response: PricingResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].best_price(), Some(dec!(2.50)));
        assert!(response.results[0].is_preferred_sub_type());
        assert_eq!(response.results[1].best_price(), None);
    }

    #[test]
    fn test_best_price_falls_back() {
        let price = ProductPrice {
            product_id: 1,
            low_price: Some(dec!(0.10)),
            mid_price: Some(dec!(0.25)),
            high_price: None,
            market_price: None,
            direct_low_price: None,
            sub_type_name: None,
        };
        assert_eq!(price.best_price(), Some(dec!(0.25)));
        assert!(!price.is_preferred_sub_type());
    }

    #[test]
    fn test_token_response() {
        let json = r#"{"access_token":"abc","token_type":"bearer","expires_in":1209599,"userName":"bot"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 1209599);
    }
}
