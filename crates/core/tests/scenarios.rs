//! End-to-end shopping scenarios against the in-memory store

use std::sync::Arc;

use jiff::SignedDuration;
use serde_json::json;
use testresult::TestResult;
use vendpass::{
    checkout::{CheckoutStep, StepOutcome},
    clock::ManualClock,
    coupons::{CouponError, CouponsService, StoreCouponsService},
    flow::{FlowError, FlowStep, ShopperFlow},
    ids::{MachineId, ProductId, TransactionId},
    money::Amount,
    sessions::{SessionError, SessionsService, StoreSessionsService},
    store::MemoryStore,
};

const NOW: i64 = 1_700_000_000;

fn vending_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_data(json!({
        "sessions": {
            "ABC123": {
                "code": "ABC123",
                "machineId": "VEND001",
                "status": "active",
                "createdAt": NOW - 60,
                "expiresAt": NOW + 240
            }
        },
        "machines": {
            "VEND001": {
                "status": "online",
                "inventory": {
                    "p1": { "name": "Chips", "price": 20, "stock": 10, "image": "🍟" },
                    "p2": { "name": "Cookies", "price": 30, "stock": 3, "image": "🍪" },
                    "p3": { "name": "Juice", "price": 40, "stock": 5, "image": "🧃" }
                }
            }
        },
        "coupons": {
            "VND-AB12-CD34": {
                "code": "VND-AB12-CD34",
                "discountPercent": 10,
                "createdAt": NOW - 60,
                "expiresAt": NOW + 7 * 24 * 3_600,
                "status": "active",
                "usedCount": 0,
                "maxUses": 1
            }
        }
    })))
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at_second(NOW))
}

#[tokio::test]
async fn valid_code_grants_its_machine() -> TestResult {
    let store = vending_store();
    let sessions = StoreSessionsService::new(store.clone(), clock());

    let grant = sessions.validate("ABC123").await?;

    assert_eq!(grant.machine_id, MachineId::new("VEND001"));
    assert_eq!(
        store.snapshot("sessions/ABC123/isLoggedIn"),
        Some(json!(true))
    );

    Ok(())
}

#[tokio::test]
async fn expired_code_is_rejected_untouched() -> TestResult {
    let store = vending_store();
    let clock = clock();
    clock.advance(SignedDuration::from_secs(240));

    let result = StoreSessionsService::new(store.clone(), clock)
        .validate("ABC123")
        .await;

    assert!(
        matches!(result, Err(SessionError::Expired)),
        "expected Expired, got {result:?}"
    );
    assert!(store.writes().is_empty());

    Ok(())
}

#[tokio::test]
async fn cart_shrinks_when_another_buyer_takes_stock() -> TestResult {
    let store = vending_store();
    let mut flow = ShopperFlow::new(store.clone(), clock());
    let cookies = ProductId::new("p2");

    flow.enter_code("ABC123").await?;
    for _ in 0..3 {
        flow.add(&cookies)?;
    }

    store.seed("machines/VEND001/inventory/p2/stock", json!(1));

    let adjustments = flow.sync_catalog().await?;

    assert_eq!(adjustments.len(), 1);
    assert_eq!(flow.cart().quantity_of(&cookies), 1);
    assert_eq!(flow.cart().subtotal(), Amount::from_major(30));
    assert!(flow.cart().lines().iter().all(|line| line.quantity <= line.stock));

    store.seed("machines/VEND001/inventory/p2/stock", json!(0));

    flow.sync_catalog().await?;

    assert!(flow.cart().is_empty());

    Ok(())
}

#[tokio::test]
async fn ten_percent_of_one_hundred() -> TestResult {
    let store = vending_store();
    let coupons = StoreCouponsService::new(store, clock());

    let applied = coupons
        .apply("VND-AB12-CD34", Amount::from_major(100))
        .await?;

    assert_eq!(applied.discount_percent, 10);
    assert_eq!(applied.discount_amount, Amount::from_minor(10_00));

    Ok(())
}

#[tokio::test]
async fn full_purchase_settles_every_record() -> TestResult {
    let store = vending_store();
    let mut flow = ShopperFlow::new(store.clone(), clock());
    let chips = ProductId::new("p1");

    flow.enter_code("ABC123").await?;
    flow.add(&chips)?;
    flow.add(&chips)?;

    let payment = flow.request_payment().await?;
    assert_eq!(payment.amount_minor, 40_00);

    let report = flow
        .payment_succeeded(TransactionId::new("pay_123"), "upi")
        .await?;

    assert_eq!(report.failures().count(), 0);
    assert_eq!(report.receipt.subtotal, Amount::from_major(40));
    assert_eq!(report.receipt.coupon_discount, Amount::ZERO);
    assert_eq!(report.receipt.total_amount, Amount::from_major(40));

    let reward = report.receipt.new_coupon.clone().expect("reward minted");
    assert_eq!(reward.discount_percent, 10);
    assert_eq!(reward.expires_at, NOW + 7 * 24 * 3_600);

    assert_eq!(flow.step(), FlowStep::Receipt);
    assert_eq!(
        store.snapshot("machines/VEND001/inventory/p1/stock"),
        Some(json!(8))
    );
    assert_eq!(
        store.snapshot("machines/VEND001/inventory/p1/lastSold"),
        Some(json!(NOW * 1_000))
    );
    assert_eq!(store.snapshot("sessions/ABC123/status"), Some(json!("paid")));
    assert_eq!(
        store.snapshot("dispenseQueue/ABC123/transactionId"),
        Some(json!("pay_123"))
    );
    assert_eq!(
        store.snapshot("transactions/pay_123/newCoupon/code"),
        Some(json!(reward.code.as_str()))
    );

    let result = StoreSessionsService::new(store.clone(), clock())
        .validate("ABC123")
        .await;
    assert!(
        matches!(result, Err(SessionError::AlreadyConsumed)),
        "expected AlreadyConsumed, got {result:?}"
    );

    Ok(())
}

#[tokio::test]
async fn stock_failure_still_reaches_the_receipt() -> TestResult {
    let store = vending_store();
    let mut flow = ShopperFlow::new(store.clone(), clock());

    flow.enter_code("ABC123").await?;
    flow.add(&ProductId::new("p3"))?;
    flow.request_payment().await?;

    store.fail_writes_under("machines");

    let report = flow
        .payment_succeeded(TransactionId::new("pay_9"), "card")
        .await?;

    assert!(report.receipt_written());
    assert!(matches!(
        report.outcome_of(&CheckoutStep::DecrementStock(ProductId::new("p3"))),
        Some(StepOutcome::Failed(_))
    ));
    assert_eq!(report.failures().count(), 1);
    assert_eq!(flow.step(), FlowStep::Receipt);
    assert_eq!(
        store.snapshot("transactions/pay_9/status"),
        Some(json!("completed"))
    );
    assert_eq!(
        store.snapshot("machines/VEND001/inventory/p3/stock"),
        Some(json!(5))
    );

    Ok(())
}

#[tokio::test]
async fn coupons_cannot_be_spent_twice() -> TestResult {
    let store = vending_store();
    let mut flow = ShopperFlow::new(store.clone(), clock());

    flow.enter_code("ABC123").await?;
    flow.add(&ProductId::new("p3"))?;
    flow.apply_coupon("VND-AB12-CD34").await?;

    assert_eq!(flow.total(), Amount::from_major(36));

    flow.request_payment().await?;
    flow.payment_succeeded(TransactionId::new("pay_1"), "upi")
        .await?;

    let result = StoreCouponsService::new(store.clone(), clock())
        .apply("VND-AB12-CD34", Amount::from_major(40))
        .await;

    assert!(
        matches!(result, Err(CouponError::AlreadyUsed)),
        "expected AlreadyUsed, got {result:?}"
    );
    assert_eq!(
        store.snapshot("transactions/pay_1/couponUsed"),
        Some(json!("VND-AB12-CD34"))
    );

    Ok(())
}

#[tokio::test]
async fn reusable_test_codes_survive_purchases() -> TestResult {
    let store = vending_store();
    let clock = clock();
    let sessions = StoreSessionsService::new(store.clone(), clock.clone());

    let issued = sessions
        .issue(vendpass::sessions::NewSession {
            ttl: SignedDuration::from_hours(400 * 24),
            reusable: true,
            ..Default::default()
        })
        .await?;
    let code = issued.code.expect("issued code").to_string();

    for reference in ["pay_a", "pay_b"] {
        let mut flow = ShopperFlow::new(store.clone(), clock.clone());

        flow.enter_code(&code).await?;
        flow.add(&ProductId::new("p1"))?;
        flow.request_payment().await?;
        flow.payment_succeeded(TransactionId::new(reference), "upi")
            .await?;
    }

    assert_eq!(
        store.snapshot(format!("sessions/{code}/usageCount").as_str()),
        Some(json!(2))
    );
    assert_eq!(
        store.snapshot(format!("sessions/{code}/status").as_str()),
        Some(json!("active"))
    );

    Ok(())
}

#[tokio::test]
async fn out_of_stock_adds_are_refused() -> TestResult {
    let store = vending_store();
    let mut flow = ShopperFlow::new(store, clock());
    let cookies = ProductId::new("p2");

    flow.enter_code("ABC123").await?;
    for _ in 0..3 {
        flow.add(&cookies)?;
    }

    let result = flow.add(&cookies);

    assert!(
        matches!(result, Err(FlowError::Cart(_))),
        "expected Cart error, got {result:?}"
    );
    assert_eq!(flow.cart().quantity_of(&cookies), 3);

    Ok(())
}
