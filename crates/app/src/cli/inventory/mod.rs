use clap::{Args, Subcommand};
use vendpass::catalog::CatalogSnapshot;

use super::{Context, output};

mod edit;
mod list;
mod watch;

#[derive(Debug, Args)]
pub(crate) struct InventoryCommand {
    #[command(subcommand)]
    command: InventorySubcommand,
}

#[derive(Debug, Subcommand)]
enum InventorySubcommand {
    /// Show every product of a machine
    List(list::ListInventoryArgs),
    /// Overwrite a product's stock
    SetStock(edit::SetStockArgs),
    /// Overwrite a product's price
    SetPrice(edit::SetPriceArgs),
    /// Add units to a product's stock
    Restock(edit::RestockArgs),
    /// Print the in-stock catalog every time it changes
    Watch(watch::WatchInventoryArgs),
}

pub(crate) async fn run(context: &Context, command: InventoryCommand) -> Result<(), String> {
    match command.command {
        InventorySubcommand::List(args) => list::run(context, args).await,
        InventorySubcommand::SetStock(args) => edit::set_stock(context, args).await,
        InventorySubcommand::SetPrice(args) => edit::set_price(context, args).await,
        InventorySubcommand::Restock(args) => edit::restock(context, args).await,
        InventorySubcommand::Watch(args) => watch::run(context, args).await,
    }
}

fn print_products(context: &Context, snapshot: &CatalogSnapshot) {
    let rows = snapshot
        .iter()
        .map(|product| {
            [
                product.id.to_string(),
                format!("{} {}", product.image, product.name),
                product.price.to_string(),
                product.stock.to_string(),
                product
                    .last_sold
                    .and_then(|millis| jiff::Timestamp::from_millisecond(millis).ok())
                    .map_or_else(|| "never".to_string(), |at| output::local(at, &context.tz)),
            ]
        })
        .collect();

    output::print_table(["Id", "Product", "Price", "Stock", "Last sold"], rows);
}
