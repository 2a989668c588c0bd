//! Catalog Sync errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("inventory subscription closed before the first snapshot")]
    Closed,

    #[error("catalog store error")]
    Store(#[from] StoreError),
}
