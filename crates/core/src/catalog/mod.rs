//! Catalog
//!
//! The shoppable product list of one machine, kept live by a subscription to
//! `machines/{machineId}/inventory`.

pub mod errors;
pub mod models;
mod sync;

pub use errors::CatalogError;
pub use models::*;
pub use sync::CatalogSync;
