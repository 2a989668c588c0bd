//! Checkout
//!
//! Turns a confirmed payment into the receipt, coupon, session, stock and
//! dispense writes that record it.

pub mod models;
mod pipeline;

pub use models::*;
pub use pipeline::CheckoutPipeline;
