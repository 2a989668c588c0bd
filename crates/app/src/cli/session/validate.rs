use clap::Args;
use vendpass::sessions::SessionsService;

use crate::cli::{Context, output};

#[derive(Debug, Args)]
pub(crate) struct ValidateSessionArgs {
    /// Pickup code as typed by the shopper
    code: String,
}

pub(crate) async fn run(context: &Context, args: ValidateSessionArgs) -> Result<(), String> {
    let grant = context
        .sessions()
        .validate(&args.code)
        .await
        .map_err(|error| format!("code rejected: {error}"))?;

    println!("code: {}", grant.code);
    println!("machine: {}", grant.machine_id);
    println!(
        "time_left: {}",
        output::remaining(context.clock.now(), grant.expires_at)
    );

    Ok(())
}
