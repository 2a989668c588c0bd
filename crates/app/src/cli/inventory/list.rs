use clap::Args;
use vendpass::{admin::AdminService, ids::MachineId, sessions::NewSession};

use crate::cli::Context;

#[derive(Debug, Args)]
pub(crate) struct ListInventoryArgs {
    /// Machine to list
    #[arg(long, default_value = NewSession::DEFAULT_MACHINE)]
    machine: String,
}

pub(crate) async fn run(context: &Context, args: ListInventoryArgs) -> Result<(), String> {
    let machine = MachineId::new(args.machine);

    let inventory = context
        .admin()
        .inventory(&machine)
        .await
        .map_err(|error| format!("failed to read inventory: {error}"))?;

    if inventory.is_empty() {
        println!("{machine} has no products");
        return Ok(());
    }

    super::print_products(context, &inventory);

    Ok(())
}
