//! Receipt e-mail

use std::{error::Error as StdError, fmt, str::FromStr};

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use thiserror::Error;

use crate::checkout::TransactionReceipt;

/// Errors raised while e-mailing a receipt.
#[derive(Debug, Error)]
pub enum EmailError {
    /// The recipient address is not usable.
    #[error("invalid e-mail address")]
    InvalidAddress,

    /// The delivery service could not be reached.
    #[error("e-mail delivery failed")]
    Delivery(#[source] Box<dyn StdError + Send + Sync>),

    /// The delivery service refused the message (status, response body).
    #[error("e-mail service rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// A recipient address, trimmed and lightly checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EmailAddress {
    type Err = EmailError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let address = raw.trim();

        let Some((local, domain)) = address.split_once('@') else {
            return Err(EmailError::InvalidAddress);
        };

        let valid = !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !address.chars().any(char::is_whitespace);

        if !valid {
            return Err(EmailError::InvalidAddress);
        }

        Ok(Self(address.to_string()))
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Template parameters of the receipt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptEmail {
    pub transaction_id: String,
    pub date: String,
    pub total_amount: String,
    pub items: String,
    pub coupon_code: Option<String>,
}

impl ReceiptEmail {
    #[must_use]
    pub fn from_receipt(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_id: receipt.transaction_id.to_string(),
            date: receipt.date.clone(),
            total_amount: receipt.total_amount.to_string(),
            items: receipt.item_summary(),
            coupon_code: receipt
                .new_coupon
                .as_ref()
                .map(|coupon| coupon.code.to_string()),
        }
    }
}

#[automock]
#[async_trait]
pub trait ReceiptMailer: Send + Sync + fmt::Debug {
    /// Deliver a receipt to `recipient`. Not retried.
    async fn send(&self, recipient: &EmailAddress, email: &ReceiptEmail)
    -> Result<(), EmailError>;
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use super::*;
    use crate::{
        cart::CartLine,
        checkout::{CheckoutRequest, RewardCoupon},
        coupons::DiscountTiming,
        ids::{MachineId, ProductId, TransactionId},
        money::Amount,
    };

    fn line(id: &str, name: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: name.to_string(),
            price: Amount::from_major(20),
            image: String::new(),
            quantity,
            stock: 9,
        }
    }

    #[test]
    fn addresses_are_lightly_checked() -> TestResult {
        let address: EmailAddress = "  shopper@example.com ".parse()?;

        assert_eq!(address.as_str(), "shopper@example.com");

        for bad in ["", "shopper", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@.com"] {
            assert!(bad.parse::<EmailAddress>().is_err(), "accepted {bad:?}");
        }

        Ok(())
    }

    #[test]
    fn payload_summarises_the_receipt() -> TestResult {
        let request = CheckoutRequest {
            transaction_id: TransactionId::new("pay_1"),
            machine_id: MachineId::new("VEND001"),
            session_code: "ABC123".parse()?,
            lines: vec![line("p1", "Chips", 2), line("p2", "Juice", 1)],
            coupon: None,
            timing: DiscountTiming::AtPayment,
            payment_method: "card".to_string(),
        };
        let reward = RewardCoupon {
            code: "VND-AB12-CD34".parse()?,
            discount_percent: 10,
            expires_at: 0,
        };
        let receipt = TransactionReceipt::new(&request, Timestamp::UNIX_EPOCH, Some(reward));

        let email = ReceiptEmail::from_receipt(&receipt);

        assert_eq!(email.transaction_id, "pay_1");
        assert_eq!(email.items, "Chips x2, Juice x1");
        assert_eq!(email.total_amount, Amount::from_major(60).to_string());
        assert_eq!(email.coupon_code.as_deref(), Some("VND-AB12-CD34"));

        Ok(())
    }
}
