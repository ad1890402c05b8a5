//! SorceryBot Library
//!
//! Card catalog, TCGplayer price caching and the card query service behind
//! a Sorcery: Contested Realm chat bot, plus its rules FAQ.

pub mod bot;
pub mod cache;
pub mod catalog;
pub mod common;
pub mod config;
pub mod faq;
pub mod pricing;
pub mod query;

// Re-export commonly used types
pub use bot::{
    BotCore, CommandHandler, CommandLog, CommandResponse, CommandRouter, FaqCommand, PrewarmReport,
};
pub use cache::{CacheStats, PriceCache};
pub use catalog::{normalize, CardCatalog, CatalogIndex};
pub use common::errors::{BotError, Result};
pub use common::traits::PriceProvider;
pub use common::types::{Card, CardResult, MatchKind, PriceSnapshot, PriceStatus};
pub use config::types::AppConfig;
pub use faq::{FaqEntry, FaqRepository};
pub use pricing::{IdentifierMap, RetryPolicy, TcgPlayerClient};
pub use query::CardQueryService;
