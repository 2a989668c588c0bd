use clap::Args;
use vendpass::{catalog::CatalogSync, ids::MachineId, sessions::NewSession};

use crate::cli::Context;

#[derive(Debug, Args)]
pub(crate) struct WatchInventoryArgs {
    /// Machine to watch
    #[arg(long, default_value = NewSession::DEFAULT_MACHINE)]
    machine: String,
}

pub(crate) async fn run(context: &Context, args: WatchInventoryArgs) -> Result<(), String> {
    let mut sync = CatalogSync::new(context.store.clone());

    let snapshot = sync
        .start(MachineId::new(args.machine))
        .await
        .map_err(|error| format!("failed to watch inventory: {error}"))?;

    super::print_products(context, &snapshot);

    while let Some(snapshot) = sync.next_change().await {
        println!();
        super::print_products(context, &snapshot);
    }

    Ok(())
}
