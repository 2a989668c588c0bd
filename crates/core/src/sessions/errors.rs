//! Session Manager errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("pickup codes are 6 letters or digits")]
    InvalidCode,

    #[error("session not found")]
    NotFound,

    #[error("session has expired")]
    Expired,

    #[error("session already used or cancelled")]
    AlreadyConsumed,

    #[error("no free pickup code after {attempts} attempts")]
    NoFreeCode { attempts: usize },

    #[error("session store error")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether the shopper can fix this by correcting the code.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::NoFreeCode { .. })
    }
}
