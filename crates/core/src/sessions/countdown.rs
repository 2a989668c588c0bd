//! Client-side session deadline.

use jiff::{SignedDuration, Timestamp};

use crate::sessions::{errors::SessionError, models::SessionGrant};

/// Counts down to a session's `expiresAt`.
///
/// The store never flips a session to `expired` on its own; the shopping screen
/// enforces the deadline by checking this countdown on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCountdown {
    expires_at: Timestamp,
}

impl SessionCountdown {
    #[must_use]
    pub const fn new(expires_at: Timestamp) -> Self {
        Self { expires_at }
    }

    /// Start counting down to the deadline of a validated session.
    #[must_use]
    pub const fn for_grant(grant: &SessionGrant) -> Self {
        Self::new(grant.expires_at)
    }

    #[must_use]
    pub const fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Time left at `now`, never negative.
    #[must_use]
    pub fn remaining(&self, now: Timestamp) -> SignedDuration {
        let left = self.expires_at.duration_since(now);

        if left.is_negative() {
            SignedDuration::ZERO
        } else {
            left
        }
    }

    /// Time left at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Expired`] once the countdown reaches zero.
    pub fn check(&self, now: Timestamp) -> Result<SignedDuration, SessionError> {
        let left = self.remaining(now);

        if left.is_zero() {
            return Err(SessionError::Expired);
        }

        Ok(left)
    }
}
