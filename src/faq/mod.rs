//! Frequently asked rules questions, looked up by topic

mod repository;

pub use repository::{FaqEntry, FaqRepository};
