use std::sync::Arc;

use clap::{Parser, Subcommand};
use jiff::tz::TimeZone;
use vendpass::{
    admin::StoreAdminService,
    clock::{Clock, SystemClock},
    coupons::StoreCouponsService,
    sessions::StoreSessionsService,
    store::RemoteStore,
};
use vendpass_app::{
    config::{MailerConfig, ReportConfig, StoreConfig},
    observability::LoggingConfig,
};

mod coupon;
mod inventory;
mod output;
mod receipt;
mod reports;
mod session;

#[derive(Debug, Parser)]
#[command(name = "vendpass", about = "Vendpass operator CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    store: StoreConfig,

    #[command(flatten)]
    mailer: MailerConfig,

    #[command(flatten)]
    report: ReportConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Pickup codes
    Session(session::SessionCommand),
    /// Machine inventory
    Inventory(inventory::InventoryCommand),
    /// Discount coupons
    Coupon(coupon::CouponCommand),
    /// Transaction receipts
    Receipt(receipt::ReceiptCommand),
    /// List transactions, newest first
    Transactions(reports::TransactionsArgs),
    /// Sales and stock figures for a machine
    Stats(reports::StatsArgs),
    /// List machines
    Machines,
}

/// Clients shared by every command.
pub(crate) struct Context {
    pub(crate) store: Arc<dyn RemoteStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) tz: TimeZone,
}

impl Context {
    pub(crate) fn sessions(&self) -> StoreSessionsService {
        StoreSessionsService::new(self.store.clone(), self.clock.clone())
    }

    pub(crate) fn coupons(&self) -> StoreCouponsService {
        StoreCouponsService::new(self.store.clone(), self.clock.clone())
    }

    pub(crate) fn admin(&self) -> StoreAdminService {
        StoreAdminService::new(self.store.clone(), Arc::new(self.sessions()))
    }
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let database = self
            .store
            .connect()
            .map_err(|error| format!("failed to configure store: {error}"))?;

        let tz = self
            .report
            .time_zone()
            .map_err(|error| format!("failed to configure reports: {error}"))?;

        let context = Context {
            store: Arc::new(database),
            clock: Arc::new(SystemClock),
            tz,
        };

        match self.command {
            Commands::Session(command) => session::run(&context, command).await,
            Commands::Inventory(command) => inventory::run(&context, command).await,
            Commands::Coupon(command) => coupon::run(&context, command).await,
            Commands::Receipt(command) => receipt::run(&context, &self.mailer, command).await,
            Commands::Transactions(args) => reports::transactions(&context, args).await,
            Commands::Stats(args) => reports::stats(&context, args).await,
            Commands::Machines => reports::machines(&context).await,
        }
    }
}
