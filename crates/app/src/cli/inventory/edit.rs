use clap::Args;
use vendpass::{
    admin::{AdminService, DEFAULT_RESTOCK},
    ids::{MachineId, ProductId},
    money::Amount,
    sessions::NewSession,
};

use crate::cli::Context;

#[derive(Debug, Args)]
pub(crate) struct ProductArgs {
    /// Machine holding the product
    #[arg(long, default_value = NewSession::DEFAULT_MACHINE)]
    machine: String,

    /// Product id
    product: String,
}

impl ProductArgs {
    fn ids(self) -> (MachineId, ProductId) {
        (MachineId::new(self.machine), ProductId::new(self.product))
    }
}

#[derive(Debug, Args)]
pub(crate) struct SetStockArgs {
    #[command(flatten)]
    product: ProductArgs,

    /// New stock level
    stock: u32,
}

#[derive(Debug, Args)]
pub(crate) struct SetPriceArgs {
    #[command(flatten)]
    product: ProductArgs,

    /// New price in rupees (e.g. `45.50`)
    price: Amount,
}

#[derive(Debug, Args)]
pub(crate) struct RestockArgs {
    #[command(flatten)]
    product: ProductArgs,

    /// Units to add
    #[arg(long, default_value_t = DEFAULT_RESTOCK)]
    by: u32,
}

pub(crate) async fn set_stock(context: &Context, args: SetStockArgs) -> Result<(), String> {
    let (machine, product) = args.product.ids();

    context
        .admin()
        .set_stock(&machine, &product, args.stock)
        .await
        .map_err(|error| format!("failed to set stock: {error}"))?;

    println!("{machine}/{product} stock: {}", args.stock);

    Ok(())
}

pub(crate) async fn set_price(context: &Context, args: SetPriceArgs) -> Result<(), String> {
    let (machine, product) = args.product.ids();

    context
        .admin()
        .set_price(&machine, &product, args.price)
        .await
        .map_err(|error| format!("failed to set price: {error}"))?;

    println!("{machine}/{product} price: {}", args.price);

    Ok(())
}

pub(crate) async fn restock(context: &Context, args: RestockArgs) -> Result<(), String> {
    let (machine, product) = args.product.ids();

    let stock = context
        .admin()
        .restock(&machine, &product, args.by)
        .await
        .map_err(|error| format!("failed to restock: {error}"))?;

    println!("{machine}/{product} stock: {stock}");

    Ok(())
}
