//! Price cache shared between the startup pre-warm and the query path

mod price_cache;

pub use price_cache::{CacheStats, PriceCache};
