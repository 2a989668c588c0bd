//! Shopper flow errors.

use thiserror::Error;

use crate::{
    cart::CartError, catalog::CatalogError, coupons::CouponError, email::EmailError,
    flow::models::FlowStep, ids::ProductId, sessions::SessionError,
};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("not available on the {actual} screen")]
    WrongStep { expected: FlowStep, actual: FlowStep },

    #[error("{0} is not offered by this machine")]
    UnknownProduct(ProductId),

    #[error("cart is empty")]
    EmptyCart,

    #[error("no payment is pending")]
    NoPendingPayment,

    #[error("a payment is still awaiting confirmation")]
    PaymentPending,

    #[error("catalog is no longer live")]
    CatalogClosed,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Email(#[from] EmailError),
}
