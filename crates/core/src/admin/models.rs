//! Admin Models

use jiff::{Timestamp, tz::TimeZone};
use serde_json::Value;

use crate::{
    catalog::CatalogSnapshot,
    ids::{MachineId, TransactionId},
    money::Amount,
};

/// Units added by a restock when no amount is given.
pub const DEFAULT_RESTOCK: u32 = 10;

/// Products with fewer units than this are flagged on the dashboard.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// A stored transaction as listed for operators.
///
/// Read leniently so receipts written by older clients still show up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
    pub id: TransactionId,
    pub machine_id: Option<MachineId>,
    pub session_code: Option<String>,
    /// `Chips x2, Juice x1`
    pub items: String,
    pub total_amount: Amount,
    pub coupon_used: Option<String>,
    pub payment_method: Option<String>,
    /// Epoch milliseconds, zero when missing.
    pub timestamp: i64,
}

impl TransactionSummary {
    #[must_use]
    pub fn from_value(id: TransactionId, value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        let items = fields
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        let name = item.get("name").and_then(Value::as_str).unwrap_or("?");
                        let quantity = item.get("quantity").and_then(Value::as_u64).unwrap_or(0);
                        format!("{name} x{quantity}")
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        Some(Self {
            machine_id: text("machineId").map(MachineId::new),
            session_code: text("sessionCode"),
            total_amount: Amount::coerce(fields.get("totalAmount")),
            coupon_used: text("couponUsed"),
            payment_method: text("paymentMethod"),
            timestamp: fields.get("timestamp").and_then(Value::as_i64).unwrap_or(0),
            items,
            id,
        })
    }

    /// When the transaction happened, if the stored timestamp is usable.
    #[must_use]
    pub fn at(&self) -> Option<Timestamp> {
        Timestamp::from_millisecond(self.timestamp).ok()
    }
}

/// Dashboard Stats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_sales: usize,
    pub total_revenue: Amount,
    pub today_sales: usize,
    pub today_revenue: Amount,
    pub low_stock: usize,
}

impl DashboardStats {
    /// Sales totals plus the low-stock count of `inventory`. "Today" is the
    /// calendar day containing `now` in `tz`.
    #[must_use]
    pub fn compute(
        transactions: &[TransactionSummary],
        inventory: &CatalogSnapshot,
        now: Timestamp,
        tz: &TimeZone,
    ) -> Self {
        let today = now.to_zoned(tz.clone()).date();

        let mut stats = Self {
            total_sales: transactions.len(),
            low_stock: inventory
                .iter()
                .filter(|product| product.stock < LOW_STOCK_THRESHOLD)
                .count(),
            ..Self::default()
        };

        for transaction in transactions {
            stats.total_revenue += transaction.total_amount;

            let is_today = transaction
                .at()
                .is_some_and(|at| at.to_zoned(tz.clone()).date() == today);

            if is_today {
                stats.today_sales += 1;
                stats.today_revenue += transaction.total_amount;
            }
        }

        stats
    }
}

/// A vending machine as listed for operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineSummary {
    pub id: MachineId,
    pub status: String,
    pub location: Option<String>,
    pub last_online: Option<Timestamp>,
    pub products: usize,
}

impl MachineSummary {
    #[must_use]
    pub fn from_value(id: MachineId, value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            status: text("status").unwrap_or_else(|| "unknown".to_string()),
            location: text("location"),
            last_online: value
                .get("lastOnline")
                .and_then(Value::as_i64)
                .and_then(|second| Timestamp::from_second(second).ok()),
            products: value
                .get("inventory")
                .and_then(Value::as_object)
                .map_or(0, serde_json::Map::len),
            id,
        }
    }
}
