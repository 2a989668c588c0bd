//! Coupon Service errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CouponError {
    #[error("not a coupon code")]
    InvalidCode,

    #[error("coupon not found")]
    NotFound,

    #[error("coupon has expired")]
    Expired,

    #[error("coupon has already been used")]
    AlreadyUsed,

    #[error("coupon store error")]
    Store(#[from] StoreError),
}
