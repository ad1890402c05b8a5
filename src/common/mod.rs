//! Types, errors and traits shared by every layer

pub mod errors;
pub mod traits;
pub mod types;
