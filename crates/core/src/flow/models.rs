//! Flow Models

use std::fmt;

use crate::{
    cart::CartLine,
    coupons::AppliedCoupon,
    ids::MachineId,
    money::Amount,
    sessions::SessionCode,
};

/// Currency every machine charges in.
pub const CURRENCY: &str = "INR";

/// Screen the shopper is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    CodeEntry,
    Shopping,
    Receipt,
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CodeEntry => "code entry",
            Self::Shopping => "shopping",
            Self::Receipt => "receipt",
        })
    }
}

/// What the payment gateway is asked to charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Amount in paise.
    pub amount_minor: u64,
    pub currency: &'static str,
    pub description: String,
}

/// Cart contents frozen when payment was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingCheckout {
    pub machine_id: MachineId,
    pub session_code: SessionCode,
    pub lines: Vec<CartLine>,
    pub coupon: Option<AppliedCoupon>,
    pub total: Amount,
}

impl PendingCheckout {
    pub fn payment_request(&self) -> PaymentRequest {
        let units: u32 = self
            .lines
            .iter()
            .fold(0, |total, line| total.saturating_add(line.quantity));

        PaymentRequest {
            amount_minor: self.total.minor(),
            currency: CURRENCY,
            description: format!("Vending purchase at {} ({units} items)", self.machine_id),
        }
    }
}
