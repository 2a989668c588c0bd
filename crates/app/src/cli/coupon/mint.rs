use clap::Args;
use jiff::Timestamp;
use vendpass::coupons::{CouponsService, REWARD_DISCOUNT_PERCENT, REWARD_PREFIX};

use crate::cli::{Context, output};

#[derive(Debug, Args)]
pub(crate) struct MintCouponArgs {
    /// Code prefix
    #[arg(long, default_value = REWARD_PREFIX)]
    prefix: String,

    /// Discount in percent
    #[arg(
        long,
        default_value_t = REWARD_DISCOUNT_PERCENT,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    percent: u8,
}

pub(crate) async fn run(context: &Context, args: MintCouponArgs) -> Result<(), String> {
    let record = context
        .coupons()
        .with_reward_percent(args.percent)
        .mint(&args.prefix)
        .await
        .map_err(|error| format!("failed to mint coupon: {error}"))?;

    let expires_at = Timestamp::from_second(record.expires_at)
        .map_err(|error| format!("coupon has an invalid expiry: {error}"))?;

    if let Some(code) = &record.code {
        println!("code: {code}");
    }
    println!("discount: {}%", record.discount_percent);
    println!("expires_at: {}", output::local(expires_at, &context.tz));

    Ok(())
}
