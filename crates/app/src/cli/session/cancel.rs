use clap::Args;
use vendpass::sessions::{CancelOutcome, SessionCode, SessionsService};

use crate::cli::Context;

#[derive(Debug, Args)]
pub(crate) struct CancelSessionArgs {
    /// Pickup code to cancel
    code: String,
}

pub(crate) async fn run(context: &Context, args: CancelSessionArgs) -> Result<(), String> {
    let code: SessionCode = args
        .code
        .parse()
        .map_err(|error| format!("invalid code: {error}"))?;

    let outcome = context
        .sessions()
        .cancel(&code)
        .await
        .map_err(|error| format!("failed to cancel session: {error}"))?;

    match outcome {
        CancelOutcome::Cancelled => println!("cancelled {code}"),
        CancelOutcome::AlreadyTerminal(status) => {
            println!("{code} was already {}", status.as_str());
        }
        CancelOutcome::NotFound => println!("no session {code}"),
    }

    Ok(())
}
