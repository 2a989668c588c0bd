use clap::Args;
use vendpass::{coupons::CouponsService, money::Amount};

use crate::cli::Context;

#[derive(Debug, Args)]
pub(crate) struct CheckCouponArgs {
    /// Coupon code
    code: String,

    /// Subtotal to price the coupon against, in rupees
    #[arg(long, default_value = "100")]
    subtotal: Amount,
}

pub(crate) async fn run(context: &Context, args: CheckCouponArgs) -> Result<(), String> {
    let applied = context
        .coupons()
        .apply(&args.code, args.subtotal)
        .await
        .map_err(|error| format!("coupon rejected: {error}"))?;

    println!("code: {}", applied.code);
    println!("discount: {}%", applied.discount_percent);
    println!("subtotal: {}", args.subtotal);
    println!("discount_amount: {}", applied.discount_amount);
    println!(
        "total: {}",
        args.subtotal.saturating_sub(applied.discount_amount)
    );

    Ok(())
}
