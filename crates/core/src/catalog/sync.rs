//! Live catalog for one machine.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    catalog::{
        errors::CatalogError,
        models::{CatalogSnapshot, parse_inventory},
    },
    ids::MachineId,
    store::{RemoteStore, StorePath, Subscription},
};

/// Keeps at most one inventory subscription open and turns each notification
/// into a [`CatalogSnapshot`].
#[derive(Debug)]
pub struct CatalogSync {
    store: Arc<dyn RemoteStore>,
    active: Option<ActiveSync>,
}

#[derive(Debug)]
struct ActiveSync {
    machine_id: MachineId,
    subscription: Subscription,
    snapshot: CatalogSnapshot,
}

impl CatalogSync {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            active: None,
        }
    }

    /// Subscribe to a machine's inventory, replacing any previous subscription.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the subscription cannot be opened.
    pub async fn start(&mut self, machine_id: MachineId) -> Result<CatalogSnapshot, CatalogError> {
        self.stop();

        let mut subscription = self
            .store
            .subscribe(&StorePath::inventory(&machine_id))
            .await?;

        let first = subscription.next().await.ok_or(CatalogError::Closed)?;
        let snapshot = parse_inventory(first.as_ref());

        info!(machine = %machine_id, products = snapshot.len(), "catalog sync started");

        self.active = Some(ActiveSync {
            machine_id,
            subscription,
            snapshot: snapshot.clone(),
        });

        Ok(snapshot)
    }

    /// Wait for the next inventory change.
    ///
    /// Returns `None` when no sync is running or the subscription has closed.
    pub async fn next_change(&mut self) -> Option<CatalogSnapshot> {
        let active = self.active.as_mut()?;

        let Some(value) = active.subscription.next().await else {
            debug!(machine = %active.machine_id, "inventory subscription closed");
            self.active = None;
            return None;
        };

        let snapshot = parse_inventory(value.as_ref());

        debug!(machine = %active.machine_id, products = snapshot.len(), "catalog changed");

        active.snapshot = snapshot.clone();

        Some(snapshot)
    }

    /// Drop the subscription. Safe to call when nothing is running.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.subscription.unsubscribe();
            debug!(machine = %active.machine_id, "catalog sync stopped");
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn machine_id(&self) -> Option<&MachineId> {
        self.active.as_ref().map(|active| &active.machine_id)
    }

    /// Most recent snapshot, if a sync is running.
    #[must_use]
    pub fn snapshot(&self) -> Option<&CatalogSnapshot> {
        self.active.as_ref().map(|active| &active.snapshot)
    }
}
