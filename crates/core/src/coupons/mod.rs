//! Coupons
//!
//! Single-use percentage discounts. A reward coupon is minted at the end of
//! every purchase; applying one only prices it, and it is consumed by the
//! checkout that pays with it.

pub mod errors;
pub mod models;
pub mod service;

pub use errors::CouponError;
pub use models::*;
pub use service::*;
