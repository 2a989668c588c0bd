//! Vendpass
//!
//! Pickup-code shopping for vending machines: a shopper types the code shown on
//! a machine, fills a cart from the machine's live inventory, pays, and the
//! purchase is settled against a shared key-path store.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod clock;
pub mod codes;
pub mod coupons;
pub mod email;
pub mod flow;
pub mod ids;
pub mod inventory;
pub mod money;
pub mod sessions;
pub mod store;
