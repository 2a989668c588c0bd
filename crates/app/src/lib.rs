//! Vendpass application clients: the Realtime Database store, the receipt
//! mailer, configuration and logging.

pub mod config;
pub mod firebase;
pub mod mailer;
pub mod observability;
