//! Admin
//!
//! Operator views over the store: inventory edits, sales figures, machines and
//! live sessions.

pub mod models;
pub mod service;

pub use models::*;
pub use service::*;
