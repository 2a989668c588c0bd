//! Shopper flow state machine.

use std::sync::Arc;

use jiff::SignedDuration;
use tracing::{debug, info, warn};

use crate::{
    cart::{Cart, LineAdjustment},
    catalog::{CatalogSnapshot, CatalogSync},
    checkout::{CheckoutPipeline, CheckoutReport, CheckoutRequest},
    clock::Clock,
    coupons::{AppliedCoupon, CouponsService, DiscountTiming, StoreCouponsService},
    email::{EmailAddress, ReceiptEmail, ReceiptMailer},
    flow::{
        errors::FlowError,
        models::{FlowStep, PaymentRequest, PendingCheckout},
    },
    ids::{ProductId, TransactionId},
    inventory::LastWriterWinsLedger,
    money::Amount,
    sessions::{
        CancelOutcome, SessionCountdown, SessionError, SessionGrant, SessionsService,
        StoreSessionsService,
    },
    store::RemoteStore,
};

/// One shopper's walk from code entry to receipt.
///
/// Events arrive one at a time through `&mut self`; remote calls are awaited
/// in place.
#[derive(Debug)]
pub struct ShopperFlow {
    sessions: Arc<dyn SessionsService>,
    coupons: Arc<dyn CouponsService>,
    pipeline: CheckoutPipeline,
    catalog: CatalogSync,
    clock: Arc<dyn Clock>,
    timing: DiscountTiming,
    step: FlowStep,
    grant: Option<SessionGrant>,
    countdown: Option<SessionCountdown>,
    cart: Cart,
    coupon: Option<AppliedCoupon>,
    pending: Option<PendingCheckout>,
    report: Option<CheckoutReport>,
}

impl ShopperFlow {
    /// Wire a flow to the store-backed services.
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, clock: Arc<dyn Clock>) -> Self {
        let sessions: Arc<dyn SessionsService> =
            Arc::new(StoreSessionsService::new(store.clone(), clock.clone()));
        let coupons: Arc<dyn CouponsService> =
            Arc::new(StoreCouponsService::new(store.clone(), clock.clone()));
        let pipeline = CheckoutPipeline::new(
            store.clone(),
            clock.clone(),
            sessions.clone(),
            coupons.clone(),
            Arc::new(LastWriterWinsLedger::new(store.clone())),
        );

        Self::from_parts(sessions, coupons, pipeline, CatalogSync::new(store), clock)
    }

    /// Wire a flow to explicit services.
    #[must_use]
    pub fn from_parts(
        sessions: Arc<dyn SessionsService>,
        coupons: Arc<dyn CouponsService>,
        pipeline: CheckoutPipeline,
        catalog: CatalogSync,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            coupons,
            pipeline,
            catalog,
            clock,
            timing: DiscountTiming::default(),
            step: FlowStep::CodeEntry,
            grant: None,
            countdown: None,
            cart: Cart::new(),
            coupon: None,
            pending: None,
            report: None,
        }
    }

    /// Choose when coupon discounts are computed.
    #[must_use]
    pub fn with_discount_timing(mut self, timing: DiscountTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Validate a typed code and open the machine's catalog.
    ///
    /// # Errors
    ///
    /// Validation and connectivity errors leave the flow on code entry.
    /// Returns [`FlowError::PaymentPending`] while an earlier payment awaits
    /// its confirmation.
    pub async fn enter_code(&mut self, code: &str) -> Result<CatalogSnapshot, FlowError> {
        self.expect_step(FlowStep::CodeEntry)?;

        if self.pending.is_some() {
            return Err(FlowError::PaymentPending);
        }

        let grant = self.sessions.validate(code).await?;
        let snapshot = self.catalog.start(grant.machine_id.clone()).await?;

        info!(code = %grant.code, machine = %grant.machine_id, "shopping started");

        self.cart.clear();
        self.coupon = None;
        self.report = None;
        self.countdown = Some(SessionCountdown::for_grant(&grant));
        self.grant = Some(grant);
        self.step = FlowStep::Shopping;

        Ok(snapshot)
    }

    /// Add one unit of a listed product.
    ///
    /// # Errors
    ///
    /// Fails when the session deadline has passed, the product is not in the
    /// current catalog or its stock is already in the cart. The cancel itself
    /// is left to the next [`tick`](Self::tick).
    pub fn add(&mut self, product_id: &ProductId) -> Result<u32, FlowError> {
        self.expect_step(FlowStep::Shopping)?;

        if let Some(countdown) = self.countdown {
            countdown.check(self.clock.now())?;
        }

        let product = self
            .catalog
            .snapshot()
            .and_then(|snapshot| snapshot.get(product_id))
            .ok_or_else(|| FlowError::UnknownProduct(product_id.clone()))?;

        Ok(self.cart.add(product)?)
    }

    /// Remove one unit; `None` when the product was not in the cart.
    ///
    /// # Errors
    ///
    /// Only available while shopping.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<Option<u32>, FlowError> {
        self.expect_step(FlowStep::Shopping)?;

        Ok(self.cart.remove(product_id))
    }

    /// Wait for the next catalog change and bring the cart back within stock.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::CatalogClosed`] when the subscription has ended.
    pub async fn sync_catalog(&mut self) -> Result<Vec<LineAdjustment>, FlowError> {
        self.expect_step(FlowStep::Shopping)?;

        let snapshot = self
            .catalog
            .next_change()
            .await
            .ok_or(FlowError::CatalogClosed)?;

        Ok(self.cart.reconcile(&snapshot))
    }

    /// Price a coupon against the current cart.
    ///
    /// # Errors
    ///
    /// Coupon rejections are returned and the previous coupon, if any, is kept.
    /// Past the session deadline the flow expires as in [`tick`](Self::tick).
    pub async fn apply_coupon(&mut self, code: &str) -> Result<&AppliedCoupon, FlowError> {
        self.expect_step(FlowStep::Shopping)?;
        self.enforce_deadline().await?;

        let applied = self.coupons.apply(code, self.cart.subtotal()).await?;

        debug!(coupon = %applied.code, discount = %applied.discount_amount, "coupon applied");

        Ok(self.coupon.insert(applied))
    }

    /// Drop the applied coupon.
    pub fn clear_coupon(&mut self) {
        self.coupon = None;
    }

    /// Check the session countdown. At zero the session is cancelled and the
    /// flow returns to code entry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Expired`] once time is up.
    pub async fn tick(&mut self) -> Result<SignedDuration, FlowError> {
        self.expect_step(FlowStep::Shopping)?;
        self.enforce_deadline().await
    }

    async fn enforce_deadline(&mut self) -> Result<SignedDuration, FlowError> {
        let Some(countdown) = self.countdown else {
            return Err(SessionError::Expired.into());
        };

        match countdown.check(self.clock.now()) {
            Ok(remaining) => Ok(remaining),
            Err(expired) => {
                info!("session countdown reached zero");

                if let Err(err) = self.exit().await {
                    warn!(error = %err, "expired session not cancelled");
                }

                Err(expired.into())
            }
        }
    }

    /// Leave the machine: cancel the session, then drop the catalog, cart and
    /// coupon.
    ///
    /// Local state is torn down even when the cancel write fails. A payment
    /// already requested can still be completed afterwards.
    ///
    /// # Errors
    ///
    /// Returns the cancel error, after tearing down.
    pub async fn exit(&mut self) -> Result<CancelOutcome, FlowError> {
        self.expect_step(FlowStep::Shopping)?;

        let outcome = match &self.grant {
            Some(grant) => self.sessions.cancel(&grant.code).await,
            None => Ok(CancelOutcome::NotFound),
        };

        self.catalog.stop();
        self.cart.clear();
        self.coupon = None;
        self.countdown = None;
        self.grant = None;
        self.step = FlowStep::CodeEntry;

        info!(?outcome, "shopper left");

        Ok(outcome?)
    }

    /// Freeze the cart for payment and describe the charge.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::EmptyCart`] when there is nothing to buy, and
    /// expires the flow as in [`tick`](Self::tick) once the session deadline
    /// has passed.
    pub async fn request_payment(&mut self) -> Result<PaymentRequest, FlowError> {
        self.expect_step(FlowStep::Shopping)?;
        self.enforce_deadline().await?;

        if self.cart.is_empty() {
            return Err(FlowError::EmptyCart);
        }

        let grant = self
            .grant
            .as_ref()
            .ok_or(FlowError::Session(SessionError::NotFound))?;

        let pending = PendingCheckout {
            machine_id: grant.machine_id.clone(),
            session_code: grant.code.clone(),
            lines: self.cart.lines().to_vec(),
            coupon: self.coupon.clone(),
            total: self.total(),
        };

        let request = pending.payment_request();
        self.pending = Some(pending);

        Ok(request)
    }

    /// Settle a payment confirmed by the gateway and show the receipt.
    ///
    /// Runs even if the shopper left or the countdown expired after payment
    /// was requested.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::NoPendingPayment`] when no payment was requested.
    pub async fn payment_succeeded(
        &mut self,
        reference: TransactionId,
        method: &str,
    ) -> Result<&CheckoutReport, FlowError> {
        let pending = self.pending.take().ok_or(FlowError::NoPendingPayment)?;

        let request = CheckoutRequest {
            transaction_id: reference,
            machine_id: pending.machine_id,
            session_code: pending.session_code,
            lines: pending.lines,
            coupon: pending.coupon,
            timing: self.timing,
            payment_method: method.to_string(),
        };

        let report = self.pipeline.run(request).await;

        self.catalog.stop();
        self.cart.clear();
        self.coupon = None;
        self.countdown = None;
        self.grant = None;
        self.step = FlowStep::Receipt;

        Ok(self.report.insert(report))
    }

    /// Forget the pending payment and keep shopping.
    pub fn payment_failed(&mut self) {
        if self.pending.take().is_some() {
            debug!("payment failed, cart kept");
        }
    }

    /// E-mail the receipt. Can be retried.
    ///
    /// # Errors
    ///
    /// Returns the address or delivery error.
    pub async fn send_receipt(
        &self,
        mailer: &dyn ReceiptMailer,
        recipient: &str,
    ) -> Result<(), FlowError> {
        self.expect_step(FlowStep::Receipt)?;

        let report = self.report.as_ref().ok_or(FlowError::WrongStep {
            expected: FlowStep::Receipt,
            actual: self.step,
        })?;

        let recipient: EmailAddress = recipient.parse()?;

        mailer
            .send(&recipient, &ReceiptEmail::from_receipt(&report.receipt))
            .await?;

        info!(transaction = %report.receipt.transaction_id, "receipt e-mailed");

        Ok(())
    }

    /// Back to code entry after the receipt.
    ///
    /// # Errors
    ///
    /// Only available on the receipt screen.
    pub fn restart(&mut self) -> Result<(), FlowError> {
        self.expect_step(FlowStep::Receipt)?;

        self.report = None;
        self.step = FlowStep::CodeEntry;

        Ok(())
    }

    /// Current screen.
    #[must_use]
    pub const fn step(&self) -> FlowStep {
        self.step
    }

    /// Current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Applied coupon, if any.
    #[must_use]
    pub const fn coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    /// Session being shopped, if any.
    #[must_use]
    pub const fn grant(&self) -> Option<&SessionGrant> {
        self.grant.as_ref()
    }

    /// Latest catalog snapshot.
    #[must_use]
    pub fn catalog(&self) -> Option<&CatalogSnapshot> {
        self.catalog.snapshot()
    }

    /// Outcome of the last checkout.
    #[must_use]
    pub const fn report(&self) -> Option<&CheckoutReport> {
        self.report.as_ref()
    }

    /// Whether a payment has been requested and not yet resolved.
    #[must_use]
    pub const fn payment_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Discount on the current cart.
    #[must_use]
    pub fn discount(&self) -> Amount {
        self.coupon.as_ref().map_or(Amount::ZERO, |coupon| {
            coupon.discount_for(self.cart.subtotal(), self.timing)
        })
    }

    /// Amount due for the current cart.
    #[must_use]
    pub fn total(&self) -> Amount {
        self.cart.subtotal().saturating_sub(self.discount())
    }

    fn expect_step(&self, expected: FlowStep) -> Result<(), FlowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(FlowError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }
}
