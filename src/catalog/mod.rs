//! Card catalog store and name index

mod index;
mod normalize;
mod store;

pub use index::{CatalogIndex, IndexEntry, IndexMatch};
pub use normalize::normalize;
pub use store::CardCatalog;
