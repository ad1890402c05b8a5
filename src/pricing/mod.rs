//! Pricing module - client implementation for the TCGplayer pricing API

pub mod auth;
pub mod client;
pub mod mapping;
pub mod messages;
pub mod retry;

pub use client::TcgPlayerClient;
pub use mapping::IdentifierMap;
pub use retry::RetryPolicy;
