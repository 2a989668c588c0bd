use clap::{Args, Subcommand};

use super::Context;

mod active;
mod cancel;
mod issue;
mod validate;

#[derive(Debug, Args)]
pub(crate) struct SessionCommand {
    #[command(subcommand)]
    command: SessionSubcommand,
}

#[derive(Debug, Subcommand)]
enum SessionSubcommand {
    /// Generate a new pickup code
    Issue(issue::IssueSessionArgs),
    /// Check a pickup code as a shopper would
    Validate(validate::ValidateSessionArgs),
    /// Cancel an active pickup code
    Cancel(cancel::CancelSessionArgs),
    /// List codes that can currently be used
    Active,
}

pub(crate) async fn run(context: &Context, command: SessionCommand) -> Result<(), String> {
    match command.command {
        SessionSubcommand::Issue(args) => issue::run(context, args).await,
        SessionSubcommand::Validate(args) => validate::run(context, args).await,
        SessionSubcommand::Cancel(args) => cancel::run(context, args).await,
        SessionSubcommand::Active => active::run(context).await,
    }
}
