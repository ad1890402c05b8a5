//! Card query service

mod service;

pub use service::{CardQueryService, DEFAULT_MAX_RESULTS};
