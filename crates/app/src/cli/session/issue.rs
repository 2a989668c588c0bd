use clap::Args;
use jiff::SignedDuration;
use vendpass::{
    ids::MachineId,
    sessions::{NewSession, SessionsService},
};

use crate::cli::{Context, output};

#[derive(Debug, Args)]
pub(crate) struct IssueSessionArgs {
    /// Machine the code unlocks
    #[arg(long, default_value = NewSession::DEFAULT_MACHINE)]
    machine: String,

    /// How long the code stays valid (e.g. `5m`, `2h`, `9000h`)
    #[arg(long, default_value = "5m")]
    ttl: SignedDuration,

    /// Return the code to active after each purchase instead of closing it
    #[arg(long)]
    reusable: bool,
}

pub(crate) async fn run(context: &Context, args: IssueSessionArgs) -> Result<(), String> {
    if !args.ttl.is_positive() {
        return Err("ttl must be positive".to_string());
    }

    let record = context
        .sessions()
        .issue(NewSession {
            machine_id: MachineId::new(args.machine),
            ttl: args.ttl,
            reusable: args.reusable,
        })
        .await
        .map_err(|error| format!("failed to issue session: {error}"))?;

    let code = record
        .code
        .as_ref()
        .map_or_else(String::new, ToString::to_string);

    println!("code: {code}");
    println!("machine: {}", record.machine_id);
    println!("expires_at: {}", output::local(record.expires_at(), &context.tz));
    println!(
        "valid_for: {}",
        output::remaining(context.clock.now(), record.expires_at())
    );
    println!("reuse: {:?}", record.reuse());

    Ok(())
}
