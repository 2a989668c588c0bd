use clap::{Args, Subcommand};
use vendpass::{
    checkout::TransactionReceipt,
    email::{EmailAddress, ReceiptEmail, ReceiptMailer},
    ids::TransactionId,
    store::{StorePath, read_record},
};
use vendpass_app::config::MailerConfig;

use super::Context;

#[derive(Debug, Args)]
pub(crate) struct ReceiptCommand {
    #[command(subcommand)]
    command: ReceiptSubcommand,
}

#[derive(Debug, Subcommand)]
enum ReceiptSubcommand {
    /// E-mail a stored receipt
    Send(SendReceiptArgs),
}

#[derive(Debug, Args)]
pub(crate) struct SendReceiptArgs {
    /// Transaction id (payment reference)
    transaction_id: String,

    /// Recipient address
    #[arg(long)]
    to: String,
}

pub(crate) async fn run(
    context: &Context,
    mailer: &MailerConfig,
    command: ReceiptCommand,
) -> Result<(), String> {
    match command.command {
        ReceiptSubcommand::Send(args) => send(context, mailer, args).await,
    }
}

async fn send(
    context: &Context,
    mailer: &MailerConfig,
    args: SendReceiptArgs,
) -> Result<(), String> {
    let recipient: EmailAddress = args
        .to
        .parse()
        .map_err(|error| format!("invalid recipient: {error}"))?;

    let mailer = mailer.mailer().map_err(|error| error.to_string())?;

    let transaction_id = TransactionId::new(args.transaction_id);
    let path = StorePath::transaction(&transaction_id);

    let receipt: TransactionReceipt = read_record(context.store.as_ref(), &path)
        .await
        .map_err(|error| format!("failed to read transaction: {error}"))?
        .ok_or_else(|| format!("no transaction {transaction_id}"))?;

    mailer
        .send(&recipient, &ReceiptEmail::from_receipt(&receipt))
        .await
        .map_err(|error| format!("failed to send receipt: {error}"))?;

    println!("sent receipt {transaction_id} to {recipient}");

    Ok(())
}
