//! Shopper flow
//!
//! Code entry, shopping and receipt screens as one state machine over the
//! session, catalog, cart, coupon and checkout services.

pub mod errors;
pub mod models;
mod shopper;

pub use errors::FlowError;
pub use models::{CURRENCY, FlowStep, PaymentRequest};
pub use shopper::ShopperFlow;
