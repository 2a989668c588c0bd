//! Coupons service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    clock::Clock,
    codes::random_segment,
    coupons::{
        errors::CouponError,
        models::{
            AppliedCoupon, COUPON_VALIDITY, CouponCode, CouponRecord, CouponStatus,
            REWARD_DISCOUNT_PERCENT,
        },
    },
    fields,
    ids::TransactionId,
    money::Amount,
    store::{RemoteStore, StorePath, encode, read_record},
};

const SEGMENT_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct StoreCouponsService {
    store: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    reward_percent: u8,
}

impl StoreCouponsService {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            reward_percent: REWARD_DISCOUNT_PERCENT,
        }
    }

    /// Mint reward coupons at `percent` instead of the standard rate.
    #[must_use]
    pub fn with_reward_percent(mut self, percent: u8) -> Self {
        self.reward_percent = percent.min(100);
        self
    }

    async fn record(&self, code: &CouponCode) -> Result<CouponRecord, CouponError> {
        read_record(self.store.as_ref(), &StorePath::coupon(code))
            .await?
            .ok_or(CouponError::NotFound)
    }

    fn fresh_code(prefix: &str) -> Result<CouponCode, CouponError> {
        let mut rng = rand::thread_rng();
        let first = random_segment(&mut rng, SEGMENT_LEN);
        let second = random_segment(&mut rng, SEGMENT_LEN);

        format!("{}-{first}-{second}", prefix.trim()).parse()
    }
}

#[async_trait]
impl CouponsService for StoreCouponsService {
    async fn apply(&self, code: &str, subtotal: Amount) -> Result<AppliedCoupon, CouponError> {
        let code: CouponCode = code.parse()?;
        let record = self.record(&code).await?;

        record.check(self.clock.now())?;

        let discount_percent = record.percent();

        Ok(AppliedCoupon {
            discount_amount: subtotal.percent(discount_percent),
            discount_percent,
            code,
        })
    }

    async fn mint(&self, prefix: &str) -> Result<CouponRecord, CouponError> {
        let code = Self::fresh_code(prefix)?;
        let now = self.clock.now().as_second();
        let path = StorePath::coupon(&code);

        let record = CouponRecord {
            code: Some(code.clone()),
            discount_percent: self.reward_percent,
            created_at: now,
            expires_at: now.saturating_add(COUPON_VALIDITY.as_secs()),
            status: CouponStatus::Active,
            used_count: 0,
            max_uses: 1,
            used_at: None,
            used_in_transaction: None,
        };

        self.store.set(&path, encode(&path, &record)?).await?;

        info!(%code, percent = record.discount_percent, "coupon minted");

        Ok(record)
    }

    async fn redeem(
        &self,
        code: &CouponCode,
        transaction_id: &TransactionId,
    ) -> Result<(), CouponError> {
        let record = self.record(code).await?;

        if record.is_used() {
            return Err(CouponError::AlreadyUsed);
        }

        self.store
            .update(
                &StorePath::coupon(code),
                fields! {
                    "status" => CouponStatus::Used.as_str(),
                    "usedAt" => self.clock.now().as_second(),
                    "usedCount" => record.used_count.saturating_add(1),
                    "usedInTransaction" => transaction_id.as_str(),
                },
            )
            .await?;

        info!(%code, transaction = %transaction_id, "coupon redeemed");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync + fmt::Debug {
    /// Price a coupon against `subtotal` without consuming it.
    async fn apply(&self, code: &str, subtotal: Amount) -> Result<AppliedCoupon, CouponError>;

    /// Create and store a new single-use reward coupon.
    async fn mint(&self, prefix: &str) -> Result<CouponRecord, CouponError>;

    /// Mark a coupon used by the given payment.
    async fn redeem(
        &self,
        code: &CouponCode,
        transaction_id: &TransactionId,
    ) -> Result<(), CouponError>;
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;
    use crate::{
        clock::ManualClock, codes::is_unambiguous, coupons::REWARD_PREFIX, store::MemoryStore,
    };

    const NOW: i64 = 1_700_000_000;

    fn coupons(store: &Arc<MemoryStore>, clock: &Arc<ManualClock>) -> StoreCouponsService {
        StoreCouponsService::new(store.clone(), clock.clone())
    }

    fn seeded() -> (Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::with_data(json!({
            "coupons": {
                "VND-AB12-CD34": {
                    "code": "VND-AB12-CD34",
                    "discountPercent": 10,
                    "createdAt": NOW - 60,
                    "expiresAt": NOW + 3_600,
                    "status": "active",
                    "usedCount": 0,
                    "maxUses": 1
                }
            }
        })));

        (store, Arc::new(ManualClock::at_second(NOW)))
    }

    #[tokio::test]
    async fn apply_computes_the_discount() -> TestResult {
        let (store, clock) = seeded();

        let applied = coupons(&store, &clock)
            .apply("vnd-ab12-cd34", Amount::from_major(100))
            .await?;

        assert_eq!(applied.discount_percent, 10);
        assert_eq!(applied.discount_amount, Amount::from_major(10));
        assert!(store.writes().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn apply_rounds_half_away_from_zero() -> TestResult {
        let (store, clock) = seeded();

        let applied = coupons(&store, &clock)
            .apply("VND-AB12-CD34", Amount::from_minor(105))
            .await?;

        assert_eq!(applied.discount_amount, Amount::from_minor(11));

        Ok(())
    }

    #[tokio::test]
    async fn apply_rejects_unknown_and_expired_coupons() {
        let (store, clock) = seeded();
        let service = coupons(&store, &clock);

        let result = service.apply("NOPE-0000", Amount::from_major(10)).await;
        assert!(
            matches!(result, Err(CouponError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        let result = service.apply("  ", Amount::from_major(10)).await;
        assert!(
            matches!(result, Err(CouponError::InvalidCode)),
            "expected InvalidCode, got {result:?}"
        );

        clock.advance(SignedDuration::from_hours(1));

        let result = service.apply("VND-AB12-CD34", Amount::from_major(10)).await;
        assert!(
            matches!(result, Err(CouponError::Expired)),
            "expected Expired, got {result:?}"
        );
    }

    #[tokio::test]
    async fn minted_coupons_are_single_use_for_a_week() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_second(NOW));
        let service = coupons(&store, &clock);

        let record = service.mint(REWARD_PREFIX).await?;
        let code = record.code.clone().expect("minted coupon has a code");

        let (prefix, rest) = code.as_str().split_at(4);
        assert_eq!(prefix, "VND-");
        assert_eq!(rest.len(), 9);
        assert!(rest.chars().filter(|c| *c != '-').all(is_unambiguous));

        assert_eq!(record.discount_percent, REWARD_DISCOUNT_PERCENT);
        assert_eq!(record.expires_at - record.created_at, 7 * 24 * 3_600);
        assert_eq!(record.max_uses, 1);
        assert!(store.snapshot(StorePath::coupon(&code)).is_some());

        Ok(())
    }

    #[tokio::test]
    async fn redeemed_coupons_cannot_be_applied_again() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_second(NOW));
        let service = coupons(&store, &clock);

        let minted = service.mint("VND").await?;
        let code = minted.code.expect("minted coupon has a code");

        service.apply(code.as_str(), Amount::from_major(50)).await?;
        service.redeem(&code, &TransactionId::new("pay_1")).await?;

        let stored = store.snapshot(StorePath::coupon(&code)).unwrap_or_default();
        assert_eq!(stored["status"], json!("used"));
        assert_eq!(stored["usedCount"], json!(1));
        assert_eq!(stored["usedInTransaction"], json!("pay_1"));

        let result = service.apply(code.as_str(), Amount::from_major(50)).await;
        assert!(
            matches!(result, Err(CouponError::AlreadyUsed)),
            "expected AlreadyUsed, got {result:?}"
        );

        let result = service.redeem(&code, &TransactionId::new("pay_2")).await;
        assert!(
            matches!(result, Err(CouponError::AlreadyUsed)),
            "expected AlreadyUsed, got {result:?}"
        );

        Ok(())
    }
}
