//! Checkout Models

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    cart::CartLine,
    coupons::{AppliedCoupon, CouponCode, CouponRecord, DiscountTiming},
    ids::{MachineId, ProductId, TransactionId},
    money::Amount,
    sessions::SessionCode,
};

/// Everything needed to settle a paid cart. Built before the payment gateway
/// is invoked so it survives the shopper leaving the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Gateway payment reference.
    pub transaction_id: TransactionId,

    /// Machine that dispenses the order.
    pub machine_id: MachineId,

    /// Session being paid for.
    pub session_code: SessionCode,

    /// Cart frozen at payment time.
    pub lines: Vec<CartLine>,

    /// Coupon applied to the cart, if any.
    pub coupon: Option<AppliedCoupon>,

    /// How the coupon discount is worked out.
    pub timing: DiscountTiming,

    /// Payment method reported by the gateway.
    pub payment_method: String,
}

impl CheckoutRequest {
    /// Sum of the line totals.
    #[must_use]
    pub fn subtotal(&self) -> Amount {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Discount charged, zero without a coupon.
    #[must_use]
    pub fn discount(&self) -> Amount {
        self.coupon.as_ref().map_or(Amount::ZERO, |coupon| {
            coupon.discount_for(self.subtotal(), self.timing)
        })
    }

    /// `subtotal - discount`, never negative.
    #[must_use]
    pub fn total(&self) -> Amount {
        self.subtotal().saturating_sub(self.discount())
    }
}

/// Receipt status as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    /// Paid and recorded.
    Completed,
}

/// A purchased line as recorded on the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    /// Product key in the machine inventory.
    pub product_id: ProductId,

    /// Display name at purchase time.
    pub name: String,

    /// Unit price at purchase time.
    pub price: Amount,

    /// Units bought.
    pub quantity: u32,

    /// `price * quantity`.
    pub line_total: Amount,

    /// Emoji or image reference.
    pub image: String,
}

impl From<&CartLine> for ReceiptItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            price: line.price,
            quantity: line.quantity,
            line_total: line.line_total(),
            image: line.image.clone(),
        }
    }
}

/// The reward coupon handed out with a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCoupon {
    /// Minted coupon code.
    pub code: CouponCode,

    /// Percentage off a future purchase.
    pub discount_percent: u8,

    /// Last redeemable moment, epoch seconds.
    pub expires_at: i64,
}

impl RewardCoupon {
    /// Reward details of a freshly minted coupon, if it carries a code.
    #[must_use]
    pub fn from_record(record: &CouponRecord) -> Option<Self> {
        Some(Self {
            code: record.code.clone()?,
            discount_percent: record.discount_percent,
            expires_at: record.expires_at,
        })
    }
}

/// Transaction Receipt
///
/// Written once under `transactions/{transactionId}` and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Gateway payment reference, also the record key.
    pub transaction_id: TransactionId,

    /// Machine that dispenses the order.
    pub machine_id: MachineId,

    /// Session that was paid for.
    pub session_code: SessionCode,

    /// Purchased lines.
    pub items: Vec<ReceiptItem>,

    /// Sum of the line totals.
    pub subtotal: Amount,

    /// Coupon redeemed with the purchase.
    pub coupon_used: Option<CouponCode>,

    /// Discount taken off the subtotal, never above it.
    pub coupon_discount: Amount,

    /// `subtotal - coupon_discount`.
    pub total_amount: Amount,

    /// Epoch milliseconds.
    pub timestamp: i64,

    /// RFC 3339.
    pub date: String,

    /// Payment method reported by the gateway.
    pub payment_method: String,

    /// Receipt status.
    pub status: ReceiptStatus,

    /// Reward coupon handed out with the receipt.
    pub new_coupon: Option<RewardCoupon>,
}

impl TransactionReceipt {
    /// Receipt for `request` paid at `at`.
    #[must_use]
    pub fn new(request: &CheckoutRequest, at: Timestamp, new_coupon: Option<RewardCoupon>) -> Self {
        Self {
            transaction_id: request.transaction_id.clone(),
            machine_id: request.machine_id.clone(),
            session_code: request.session_code.clone(),
            items: request.lines.iter().map(ReceiptItem::from).collect(),
            subtotal: request.subtotal(),
            coupon_used: request.coupon.as_ref().map(|coupon| coupon.code.clone()),
            coupon_discount: request.discount(),
            total_amount: request.total(),
            timestamp: at.as_millisecond(),
            date: at.to_string(),
            payment_method: request.payment_method.clone(),
            status: ReceiptStatus::Completed,
            new_coupon,
        }
    }

    /// `Chips x2, Juice x1`
    #[must_use]
    pub fn item_summary(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{} x{}", item.name, item.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Dispense status as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispenseStatus {
    /// Waiting for the machine to release the items.
    Pending,
}

/// One product to release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseItem {
    /// Product key in the machine inventory.
    pub product_id: ProductId,

    /// Units to release.
    pub quantity: u32,

    /// Display name.
    pub name: String,

    /// Queue time, epoch milliseconds.
    pub timestamp: i64,
}

/// Instruction for the machine to release the purchased items, written to
/// `dispenseQueue/{code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseInstruction {
    /// Machine that releases the items.
    pub machine_id: MachineId,

    /// Payment being fulfilled.
    pub transaction_id: TransactionId,

    /// Dispense status.
    pub status: DispenseStatus,

    /// Queue time, epoch milliseconds.
    pub created_at: i64,

    /// Products to release.
    pub items: Vec<DispenseItem>,
}

impl DispenseInstruction {
    /// Instruction for everything on `receipt`.
    #[must_use]
    pub fn for_receipt(receipt: &TransactionReceipt) -> Self {
        Self {
            machine_id: receipt.machine_id.clone(),
            transaction_id: receipt.transaction_id.clone(),
            status: DispenseStatus::Pending,
            created_at: receipt.timestamp,
            items: receipt
                .items
                .iter()
                .map(|item| DispenseItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    name: item.name.clone(),
                    timestamp: receipt.timestamp,
                })
                .collect(),
        }
    }
}

/// One write of the commit sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutStep {
    MintReward,
    WriteReceipt,
    RedeemCoupon,
    CloseSession,
    DecrementStock(ProductId),
    EnqueueDispense,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MintReward => f.write_str("mint reward coupon"),
            Self::WriteReceipt => f.write_str("write receipt"),
            Self::RedeemCoupon => f.write_str("redeem coupon"),
            Self::CloseSession => f.write_str("close session"),
            Self::DecrementStock(product) => write!(f, "decrement stock of {product}"),
            Self::EnqueueDispense => f.write_str("enqueue dispense"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    /// Not attempted, either because there was nothing to do or because the
    /// receipt could not be written.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: CheckoutStep,
    pub outcome: StepOutcome,
}

/// What a checkout run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReport {
    pub receipt: TransactionReceipt,
    pub steps: Vec<StepReport>,
}

impl CheckoutReport {
    /// Steps that failed, in the order they ran.
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|report| matches!(report.outcome, StepOutcome::Failed(_)))
    }

    /// Whether the receipt reached the store.
    #[must_use]
    pub fn receipt_written(&self) -> bool {
        self.outcome_of(&CheckoutStep::WriteReceipt) == Some(&StepOutcome::Succeeded)
    }

    #[must_use]
    pub fn outcome_of(&self, step: &CheckoutStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|report| &report.step == step)
            .map(|report| &report.outcome)
    }
}
