//! Session Models

use std::{fmt, str::FromStr};

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{
    ids::{MachineId, TransactionId},
    sessions::errors::SessionError,
};

/// Number of characters in a pickup code.
pub const SESSION_CODE_LEN: usize = 6;

/// Lifetime at or beyond which a session counts as a permanent test code.
pub const REUSABLE_LIFETIME: SignedDuration = SignedDuration::from_hours(365 * 24);

/// A pickup code as shown on the machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionCode(String);

impl SessionCode {
    /// The code as typed, upper-cased.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionCode {
    type Err = SessionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = raw.trim().to_ascii_uppercase();

        if code.chars().count() != SESSION_CODE_LEN
            || !code.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(SessionError::InvalidCode);
        }

        Ok(Self(code))
    }
}

impl TryFrom<String> for SessionCode {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionCode> for String {
    fn from(value: SessionCode) -> Self {
        value.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session status as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Waiting for, or in, a shopping flow.
    Active,

    /// Settled by a payment.
    Paid,

    /// Abandoned by the shopper or the countdown.
    Cancelled,

    /// Past its deadline. Only written by operators.
    Expired,
}

impl SessionStatus {
    /// Persisted name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

/// Whether a session may be shopped with more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionReuse {
    /// Ordinary pickup code: terminal after payment.
    SingleUse,

    /// Permanent test code: back to `active` after each payment.
    Reusable,
}

/// Session Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Pickup code, also the record key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<SessionCode>,

    /// Machine the code unlocks.
    pub machine_id: MachineId,

    /// Lifecycle status.
    pub status: SessionStatus,

    /// Issue time, epoch seconds.
    pub created_at: i64,

    /// Deadline, epoch seconds.
    pub expires_at: i64,

    /// Payment that last settled the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transaction_id: Option<TransactionId>,

    /// Completed purchases, tracked for reusable codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<u32>,

    /// Set while a shopper holds the session open.
    #[serde(default)]
    pub is_logged_in: bool,
}

impl SessionRecord {
    /// Whether the code can start a shopping flow at `now`.
    #[must_use]
    pub fn is_usable(&self, now: Timestamp) -> bool {
        self.status == SessionStatus::Active && self.expires_at > now.as_second()
    }

    /// Whether the deadline has passed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now.as_second()
    }

    /// Which reuse policy applies to this session.
    #[must_use]
    pub fn reuse(&self) -> SessionReuse {
        let lifetime = self.expires_at.saturating_sub(self.created_at);

        if self.usage_count.is_some() || lifetime >= REUSABLE_LIFETIME.as_secs() {
            SessionReuse::Reusable
        } else {
            SessionReuse::SingleUse
        }
    }

    /// Deadline as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        Timestamp::from_second(self.expires_at).unwrap_or(Timestamp::MAX)
    }
}

/// The right to shop, handed back by a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub code: SessionCode,
    pub machine_id: MachineId,
    pub expires_at: Timestamp,
}

/// New Session Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub machine_id: MachineId,
    pub ttl: SignedDuration,
    pub reusable: bool,
}

impl NewSession {
    /// Default lifetime of a generated code.
    pub const DEFAULT_TTL: SignedDuration = SignedDuration::from_secs(300);

    /// Default machine for generated test codes.
    pub const DEFAULT_MACHINE: &'static str = "VEND001";
}

impl Default for NewSession {
    fn default() -> Self {
        Self {
            machine_id: MachineId::new(Self::DEFAULT_MACHINE),
            ttl: Self::DEFAULT_TTL,
            reusable: false,
        }
    }
}

/// Result of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The session was active and is now cancelled.
    Cancelled,

    /// The session had already reached the given state; nothing was written.
    AlreadyTerminal(SessionStatus),

    /// No session with that code; nothing was written.
    NotFound,
}

/// Result of closing a session after payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Single-use session marked `paid`.
    Paid,

    /// Reusable session returned to `active`.
    Reactivated {
        /// Purchases made with this code so far.
        usage_count: u32,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn record(status: SessionStatus, created_at: i64, expires_at: i64) -> SessionRecord {
        SessionRecord {
            code: Some("ABC123".parse().expect("valid code")),
            machine_id: MachineId::new("VEND001"),
            status,
            created_at,
            expires_at,
            last_transaction_id: None,
            usage_count: None,
            is_logged_in: false,
        }
    }

    #[test]
    fn code_is_trimmed_and_upper_cased() -> TestResult {
        let code: SessionCode = "  abc123 ".parse()?;

        assert_eq!(code.as_str(), "ABC123");

        Ok(())
    }

    #[test]
    fn code_rejects_wrong_length_and_symbols() {
        assert!("ABC12".parse::<SessionCode>().is_err());
        assert!("ABC1234".parse::<SessionCode>().is_err());
        assert!("ABC-12".parse::<SessionCode>().is_err());
    }

    #[test]
    fn usable_only_when_active_and_unexpired() -> TestResult {
        let now = Timestamp::from_second(1_000)?;

        assert!(record(SessionStatus::Active, 900, 1_001).is_usable(now));
        assert!(!record(SessionStatus::Active, 900, 1_000).is_usable(now));
        assert!(!record(SessionStatus::Paid, 900, 2_000).is_usable(now));

        Ok(())
    }

    #[test]
    fn long_lived_or_counted_sessions_are_reusable() {
        let short = record(SessionStatus::Active, 0, 300);
        let long = record(SessionStatus::Active, 0, REUSABLE_LIFETIME.as_secs());
        let counted = SessionRecord {
            usage_count: Some(0),
            ..short.clone()
        };

        assert_eq!(short.reuse(), SessionReuse::SingleUse);
        assert_eq!(long.reuse(), SessionReuse::Reusable);
        assert_eq!(counted.reuse(), SessionReuse::Reusable);
    }

    #[test]
    fn record_uses_camel_case_fields() -> TestResult {
        let value = json!({
            "code": "ABC123",
            "machineId": "VEND001",
            "status": "active",
            "createdAt": 100,
            "expiresAt": 400
        });

        let parsed: SessionRecord = serde_json::from_value(value)?;

        assert_eq!(parsed, record(SessionStatus::Active, 100, 400));

        Ok(())
    }
}
