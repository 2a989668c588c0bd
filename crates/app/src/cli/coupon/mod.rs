use clap::{Args, Subcommand};

use super::Context;

mod check;
mod mint;

#[derive(Debug, Args)]
pub(crate) struct CouponCommand {
    #[command(subcommand)]
    command: CouponSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponSubcommand {
    /// Create a single-use coupon
    Mint(mint::MintCouponArgs),
    /// Price a coupon against a subtotal without using it
    Check(check::CheckCouponArgs),
}

pub(crate) async fn run(context: &Context, command: CouponCommand) -> Result<(), String> {
    match command.command {
        CouponSubcommand::Mint(args) => mint::run(context, args).await,
        CouponSubcommand::Check(args) => check::run(context, args).await,
    }
}
