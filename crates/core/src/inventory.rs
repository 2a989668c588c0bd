//! Inventory ledger
//!
//! Stock is decremented by whichever browser completed the purchase. The store
//! has no conditional writes, so concurrent purchases of the same product race
//! and the last write wins; stock can be oversold by the purchases in flight.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::models::coerce_stock,
    fields,
    ids::{MachineId, ProductId},
    store::{RemoteStore, StoreError, StorePath},
};

/// Errors raised while adjusting stock.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The machine does not list the product.
    #[error("{product} is not stocked by {machine}")]
    UnknownProduct {
        machine: MachineId,
        product: ProductId,
    },

    #[error("inventory store error")]
    Store(#[from] StoreError),
}

/// Stock before and after a decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: ProductId,
    pub previous: u32,
    pub remaining: u32,
}

#[automock]
#[async_trait]
pub trait InventoryLedger: Send + Sync + fmt::Debug {
    /// Take `quantity` units of a product out of a machine's stock, never going
    /// below zero, and stamp `lastSold`.
    async fn decrement(
        &self,
        machine: &MachineId,
        product: &ProductId,
        quantity: u32,
        sold_at: Timestamp,
    ) -> Result<StockChange, InventoryError>;
}

/// Read-modify-write ledger over the remote store.
#[derive(Debug, Clone)]
pub struct LastWriterWinsLedger {
    store: Arc<dyn RemoteStore>,
}

impl LastWriterWinsLedger {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InventoryLedger for LastWriterWinsLedger {
    async fn decrement(
        &self,
        machine: &MachineId,
        product: &ProductId,
        quantity: u32,
        sold_at: Timestamp,
    ) -> Result<StockChange, InventoryError> {
        let path = StorePath::product(machine, product);

        let Some(Value::Object(current)) = self.store.read(&path).await? else {
            return Err(InventoryError::UnknownProduct {
                machine: machine.clone(),
                product: product.clone(),
            });
        };

        let previous = coerce_stock(current.get("stock"));
        let remaining = previous.saturating_sub(quantity);

        self.store
            .update(
                &path,
                fields! {
                    "stock" => remaining,
                    "lastSold" => sold_at.as_millisecond(),
                },
            )
            .await?;

        debug!(%machine, %product, previous, remaining, "stock decremented");

        Ok(StockChange {
            product_id: product.clone(),
            previous,
            remaining,
        })
    }
}
