//! Sessions
//!
//! A session is the right to shop at one machine, granted by typing the pickup
//! code shown on its screen. Codes are created by the machine (or by
//! [`SessionsService::issue`] for test codes) and move from `active` to a
//! terminal `paid` or `cancelled`. Expiry is never written back: an `active`
//! record past its `expiresAt` simply stops validating.

mod countdown;
pub mod errors;
pub mod models;
pub mod service;

pub use countdown::SessionCountdown;
pub use errors::SessionError;
pub use models::*;
pub use service::*;
