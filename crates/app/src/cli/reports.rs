use clap::Args;
use vendpass::{admin::AdminService, ids::MachineId, sessions::NewSession};

use super::{Context, output};

#[derive(Debug, Args)]
pub(crate) struct TransactionsArgs {
    /// Show at most this many transactions
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[derive(Debug, Args)]
pub(crate) struct StatsArgs {
    /// Machine whose stock is counted
    #[arg(long, default_value = NewSession::DEFAULT_MACHINE)]
    machine: String,
}

pub(crate) async fn transactions(context: &Context, args: TransactionsArgs) -> Result<(), String> {
    let transactions = context
        .admin()
        .transactions()
        .await
        .map_err(|error| format!("failed to list transactions: {error}"))?;

    if transactions.is_empty() {
        println!("no transactions");
        return Ok(());
    }

    let rows = transactions
        .iter()
        .take(args.limit)
        .map(|transaction| {
            [
                transaction.id.to_string(),
                transaction
                    .at()
                    .map_or_else(String::new, |at| output::local(at, &context.tz)),
                transaction
                    .machine_id
                    .as_ref()
                    .map_or_else(String::new, ToString::to_string),
                transaction.items.clone(),
                transaction.total_amount.to_string(),
                transaction.coupon_used.clone().unwrap_or_default(),
                transaction.payment_method.clone().unwrap_or_default(),
            ]
        })
        .collect();

    output::print_table(
        ["Id", "Date", "Machine", "Items", "Total", "Coupon", "Method"],
        rows,
    );

    Ok(())
}

pub(crate) async fn stats(context: &Context, args: StatsArgs) -> Result<(), String> {
    let stats = context
        .admin()
        .dashboard(&MachineId::new(args.machine), context.clock.now(), &context.tz)
        .await
        .map_err(|error| format!("failed to compute stats: {error}"))?;

    output::print_table(
        ["Sales", "Revenue", "Today", "Today's revenue", "Low stock"],
        vec![[
            stats.total_sales.to_string(),
            stats.total_revenue.to_string(),
            stats.today_sales.to_string(),
            stats.today_revenue.to_string(),
            stats.low_stock.to_string(),
        ]],
    );

    Ok(())
}

pub(crate) async fn machines(context: &Context) -> Result<(), String> {
    let machines = context
        .admin()
        .machines()
        .await
        .map_err(|error| format!("failed to list machines: {error}"))?;

    if machines.is_empty() {
        println!("no machines");
        return Ok(());
    }

    let now = context.clock.now();

    let rows = machines
        .iter()
        .map(|machine| {
            [
                machine.id.to_string(),
                machine.status.clone(),
                machine.location.clone().unwrap_or_default(),
                machine.products.to_string(),
                machine.last_online.map_or_else(
                    || "never".to_string(),
                    |at| output::ago(at, now),
                ),
            ]
        })
        .collect();

    output::print_table(["Id", "Status", "Location", "Products", "Last online"], rows);

    Ok(())
}
