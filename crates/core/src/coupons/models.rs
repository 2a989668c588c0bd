//! Coupon Models

use std::{fmt, str::FromStr};

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{coupons::errors::CouponError, ids::TransactionId, money::Amount};

/// Percentage granted by a reward coupon.
pub const REWARD_DISCOUNT_PERCENT: u8 = 10;

/// Prefix of reward coupon codes.
pub const REWARD_PREFIX: &str = "VND";

/// How long a minted coupon stays redeemable.
pub const COUPON_VALIDITY: SignedDuration = SignedDuration::from_hours(7 * 24);

const MAX_CODE_LEN: usize = 32;

/// Coupon code such as `VND-AB12-CD34`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    /// The code, upper-cased.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CouponCode {
    type Err = CouponError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = raw.trim().to_ascii_uppercase();

        let well_formed = !code.is_empty()
            && code.len() <= MAX_CODE_LEN
            && code.chars().any(|c| c.is_ascii_alphanumeric())
            && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

        if !well_formed {
            return Err(CouponError::InvalidCode);
        }

        Ok(Self(code))
    }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CouponCode> for String {
    fn from(value: CouponCode) -> Self {
        value.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coupon status as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    /// Redeemable until it expires.
    Active,

    /// Redeemed up to its limit.
    Used,
}

impl CouponStatus {
    /// Persisted name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Used => "used",
        }
    }
}

const fn default_max_uses() -> u32 {
    1
}

/// Coupon Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRecord {
    /// Coupon code, also the record key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CouponCode>,

    /// Percentage off the subtotal.
    pub discount_percent: u8,

    /// Mint time, epoch seconds.
    pub created_at: i64,

    /// Last redeemable moment, epoch seconds.
    pub expires_at: i64,

    /// Redemption status.
    pub status: CouponStatus,

    /// Redemptions so far.
    #[serde(default)]
    pub used_count: u32,

    /// Redemptions allowed.
    #[serde(default = "default_max_uses")]
    pub max_uses: u32,

    /// Last redemption time, epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<i64>,

    /// Payment that last redeemed the coupon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_in_transaction: Option<TransactionId>,
}

impl CouponRecord {
    /// Whether the coupon has been used up.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.status == CouponStatus::Used || self.used_count >= self.max_uses
    }

    /// Check the coupon can be applied at `now`.
    ///
    /// # Errors
    ///
    /// [`CouponError::AlreadyUsed`] takes precedence over [`CouponError::Expired`].
    pub fn check(&self, now: Timestamp) -> Result<(), CouponError> {
        if self.is_used() {
            return Err(CouponError::AlreadyUsed);
        }

        if self.expires_at <= now.as_second() {
            return Err(CouponError::Expired);
        }

        Ok(())
    }

    /// Percentage, capped at 100.
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.discount_percent.min(100)
    }
}

/// When the discount of an applied coupon is worked out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscountTiming {
    /// Keep the amount computed when the coupon was applied.
    AtApply,

    /// Recompute against the subtotal being paid.
    #[default]
    AtPayment,
}

/// A coupon accepted for the current cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    /// Code the shopper entered.
    pub code: CouponCode,

    /// Percentage off the subtotal.
    pub discount_percent: u8,

    /// Discount on the subtotal seen at apply time.
    pub discount_amount: Amount,
}

impl AppliedCoupon {
    /// Discount to charge on `subtotal`, never more than `subtotal` itself.
    #[must_use]
    pub fn discount_for(&self, subtotal: Amount, timing: DiscountTiming) -> Amount {
        match timing {
            DiscountTiming::AtApply => self.discount_amount.min(subtotal),
            DiscountTiming::AtPayment => subtotal.percent(self.discount_percent),
        }
    }
}
