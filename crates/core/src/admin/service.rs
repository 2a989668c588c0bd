//! Admin service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::{Timestamp, tz::TimeZone};
use mockall::automock;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::{
    admin::models::{DashboardStats, MachineSummary, TransactionSummary},
    catalog::{CatalogSnapshot, models::coerce_stock, parse_inventory_all},
    fields,
    ids::{MachineId, ProductId, TransactionId},
    money::Amount,
    sessions::{SessionError, SessionRecord, SessionsService},
    store::{RemoteStore, StoreError, StorePath},
};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{product} is not stocked by {machine}")]
    UnknownProduct {
        machine: MachineId,
        product: ProductId,
    },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("admin store error")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct StoreAdminService {
    store: Arc<dyn RemoteStore>,
    sessions: Arc<dyn SessionsService>,
}

impl StoreAdminService {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, sessions: Arc<dyn SessionsService>) -> Self {
        Self { store, sessions }
    }

    async fn children(
        &self,
        path: &StorePath,
    ) -> Result<serde_json::Map<String, Value>, StoreError> {
        match self.store.read(path).await? {
            Some(Value::Object(children)) => Ok(children),
            _ => Ok(serde_json::Map::new()),
        }
    }
}

#[async_trait]
impl AdminService for StoreAdminService {
    async fn inventory(&self, machine: &MachineId) -> Result<CatalogSnapshot, AdminError> {
        let node = self.store.read(&StorePath::inventory(machine)).await?;

        Ok(parse_inventory_all(node.as_ref()))
    }

    async fn set_stock(
        &self,
        machine: &MachineId,
        product: &ProductId,
        stock: u32,
    ) -> Result<(), AdminError> {
        self.store
            .update(&StorePath::product(machine, product), fields! { "stock" => stock })
            .await?;

        info!(%machine, %product, stock, "stock set");

        Ok(())
    }

    async fn set_price(
        &self,
        machine: &MachineId,
        product: &ProductId,
        price: Amount,
    ) -> Result<(), AdminError> {
        self.store
            .update(&StorePath::product(machine, product), fields! { "price" => price })
            .await?;

        info!(%machine, %product, %price, "price set");

        Ok(())
    }

    async fn restock(
        &self,
        machine: &MachineId,
        product: &ProductId,
        by: u32,
    ) -> Result<u32, AdminError> {
        let path = StorePath::product(machine, product);

        let Some(Value::Object(current)) = self.store.read(&path).await? else {
            return Err(AdminError::UnknownProduct {
                machine: machine.clone(),
                product: product.clone(),
            });
        };

        let stock = coerce_stock(current.get("stock")).saturating_add(by);

        self.store.update(&path, fields! { "stock" => stock }).await?;

        info!(%machine, %product, by, stock, "restocked");

        Ok(stock)
    }

    async fn transactions(&self) -> Result<Vec<TransactionSummary>, AdminError> {
        let mut transactions: Vec<_> = self
            .children(&StorePath::transactions())
            .await?
            .iter()
            .filter_map(|(id, value)| {
                TransactionSummary::from_value(TransactionId::new(id.as_str()), value)
            })
            .collect();

        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(transactions)
    }

    async fn dashboard(
        &self,
        machine: &MachineId,
        now: Timestamp,
        tz: &TimeZone,
    ) -> Result<DashboardStats, AdminError> {
        let transactions = self.transactions().await?;
        let inventory = self.inventory(machine).await?;

        Ok(DashboardStats::compute(&transactions, &inventory, now, tz))
    }

    async fn machines(&self) -> Result<Vec<MachineSummary>, AdminError> {
        let mut machines: Vec<_> = self
            .children(&StorePath::machines())
            .await?
            .iter()
            .map(|(id, value)| MachineSummary::from_value(MachineId::new(id.as_str()), value))
            .collect();

        machines.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(machines)
    }

    async fn active_sessions(&self) -> Result<Vec<SessionRecord>, AdminError> {
        Ok(self.sessions.active_sessions().await?)
    }
}

#[automock]
#[async_trait]
pub trait AdminService: Send + Sync + fmt::Debug {
    /// Every product of a machine, sold out ones included.
    async fn inventory(&self, machine: &MachineId) -> Result<CatalogSnapshot, AdminError>;

    /// Overwrite a product's stock.
    async fn set_stock(
        &self,
        machine: &MachineId,
        product: &ProductId,
        stock: u32,
    ) -> Result<(), AdminError>;

    /// Overwrite a product's price.
    async fn set_price(
        &self,
        machine: &MachineId,
        product: &ProductId,
        price: Amount,
    ) -> Result<(), AdminError>;

    /// Add `by` units to a product's stock, returning the new stock.
    async fn restock(
        &self,
        machine: &MachineId,
        product: &ProductId,
        by: u32,
    ) -> Result<u32, AdminError>;

    /// All transactions, newest first.
    async fn transactions(&self) -> Result<Vec<TransactionSummary>, AdminError>;

    /// Sales and stock figures for one machine.
    async fn dashboard(
        &self,
        machine: &MachineId,
        now: Timestamp,
        tz: &TimeZone,
    ) -> Result<DashboardStats, AdminError>;

    /// All machines, by id.
    async fn machines(&self) -> Result<Vec<MachineSummary>, AdminError>;

    /// Sessions that can currently be validated.
    async fn active_sessions(&self) -> Result<Vec<SessionRecord>, AdminError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;
    use crate::{
        clock::ManualClock,
        sessions::{MockSessionsService, StoreSessionsService},
        store::MemoryStore,
    };

    const NOW: i64 = 1_700_000_000;

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_data(json!({
            "machines": {
                "VEND002": { "status": "offline", "location": "Lobby" },
                "VEND001": {
                    "status": "online",
                    "lastOnline": NOW,
                    "inventory": {
                        "p1": { "name": "Chips", "price": 20, "stock": 3 },
                        "p2": { "name": "Juice", "price": 40, "stock": 0 }
                    }
                }
            },
            "transactions": {
                "old": { "totalAmount": 20, "timestamp": (NOW - 86_400) * 1_000 },
                "new": { "totalAmount": 40, "timestamp": NOW * 1_000 }
            },
            "sessions": {
                "ABC123": { "machineId": "VEND001", "status": "active", "createdAt": NOW, "expiresAt": NOW + 300 }
            }
        })))
    }

    fn admin(store: &Arc<MemoryStore>) -> StoreAdminService {
        let clock = Arc::new(ManualClock::at_second(NOW));

        StoreAdminService::new(
            store.clone(),
            Arc::new(StoreSessionsService::new(store.clone(), clock)),
        )
    }

    #[tokio::test]
    async fn inventory_includes_sold_out_products() -> TestResult {
        let store = store();

        let inventory = admin(&store).inventory(&MachineId::new("VEND001")).await?;

        assert_eq!(inventory.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn edits_merge_into_the_product() -> TestResult {
        let store = store();
        let admin = admin(&store);
        let machine = MachineId::new("VEND001");
        let product = ProductId::new("p2");

        admin.set_price(&machine, &product, Amount::from_minor(4_550)).await?;
        assert_eq!(admin.restock(&machine, &product, 10).await?, 10);
        admin.set_stock(&machine, &ProductId::new("p1"), 7).await?;

        assert_eq!(
            store.snapshot("machines/VEND001/inventory/p2"),
            Some(json!({ "name": "Juice", "price": 45.5, "stock": 10 }))
        );
        assert_eq!(
            store.snapshot("machines/VEND001/inventory/p1/stock"),
            Some(json!(7))
        );

        let result = admin.restock(&machine, &ProductId::new("p9"), 10).await;
        assert!(
            matches!(result, Err(AdminError::UnknownProduct { .. })),
            "expected UnknownProduct, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn transactions_are_newest_first() -> TestResult {
        let store = store();

        let ids: Vec<_> = admin(&store)
            .transactions()
            .await?
            .into_iter()
            .map(|t| t.id.into_string())
            .collect();

        assert_eq!(ids, vec!["new", "old"]);

        Ok(())
    }

    #[tokio::test]
    async fn dashboard_combines_sales_and_stock() -> TestResult {
        let store = store();
        let now = Timestamp::from_second(NOW)?;

        let stats = admin(&store)
            .dashboard(&MachineId::new("VEND001"), now, &TimeZone::UTC)
            .await?;

        assert_eq!(stats.total_sales, 2);
        assert_eq!(stats.total_revenue, Amount::from_major(60));
        assert_eq!(stats.today_sales, 1);
        assert_eq!(stats.low_stock, 2);

        Ok(())
    }

    #[tokio::test]
    async fn machines_are_listed_by_id() -> TestResult {
        let store = store();

        let machines = admin(&store).machines().await?;

        assert_eq!(machines.len(), 2);
        assert_eq!(machines.first().map(|m| m.status.as_str()), Some("online"));
        assert_eq!(machines.last().and_then(|m| m.location.as_deref()), Some("Lobby"));

        Ok(())
    }

    #[tokio::test]
    async fn active_sessions_come_from_the_session_manager() -> TestResult {
        let store = store();
        let mut sessions = MockSessionsService::new();

        sessions
            .expect_active_sessions()
            .once()
            .returning(|| Ok(Vec::new()));

        let admin = StoreAdminService::new(store.clone(), Arc::new(sessions));

        assert!(admin.active_sessions().await?.is_empty());

        Ok(())
    }
}
