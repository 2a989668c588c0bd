//! Post-payment commit sequence.
//!
//! The payment has already been confirmed when this runs, so nothing here can
//! fail the purchase. The receipt is the record that the purchase happened;
//! every later write is bookkeeping that is logged and reported when it fails.

use std::{error::Error as StdError, sync::Arc};

use tracing::{error, info, warn};

use crate::{
    checkout::models::{
        CheckoutReport, CheckoutRequest, CheckoutStep, DispenseInstruction, RewardCoupon,
        StepOutcome, StepReport, TransactionReceipt,
    },
    clock::Clock,
    coupons::{CouponsService, REWARD_PREFIX},
    inventory::InventoryLedger,
    sessions::SessionsService,
    store::{RemoteStore, StoreError, StorePath, encode},
};

#[derive(Debug, Clone)]
pub struct CheckoutPipeline {
    store: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    sessions: Arc<dyn SessionsService>,
    coupons: Arc<dyn CouponsService>,
    ledger: Arc<dyn InventoryLedger>,
}

impl CheckoutPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        sessions: Arc<dyn SessionsService>,
        coupons: Arc<dyn CouponsService>,
        ledger: Arc<dyn InventoryLedger>,
    ) -> Self {
        Self {
            store,
            clock,
            sessions,
            coupons,
            ledger,
        }
    }

    /// Settle a paid checkout. Each write is awaited before the next starts.
    pub async fn run(&self, request: CheckoutRequest) -> CheckoutReport {
        let now = self.clock.now();
        let transaction = request.transaction_id.clone();
        let mut steps = Vec::new();

        let new_coupon = match self.coupons.mint(REWARD_PREFIX).await {
            Ok(record) => {
                steps.push(succeeded(CheckoutStep::MintReward));
                RewardCoupon::from_record(&record)
            }
            Err(err) => {
                warn!(%transaction, error = %reason(&err), "reward coupon not minted");
                steps.push(failed(CheckoutStep::MintReward, &err));
                None
            }
        };

        let receipt = TransactionReceipt::new(&request, now, new_coupon);

        if let Err(err) = self.write_receipt(&receipt).await {
            error!(%transaction, error = %reason(&err), "receipt not written");
            steps.push(failed(CheckoutStep::WriteReceipt, &err));
            steps.extend(remaining_steps(&request).map(skipped));

            return CheckoutReport { receipt, steps };
        }

        steps.push(succeeded(CheckoutStep::WriteReceipt));

        let redeem = match &request.coupon {
            None => skipped(CheckoutStep::RedeemCoupon),
            Some(coupon) => match self.coupons.redeem(&coupon.code, &transaction).await {
                Ok(()) => succeeded(CheckoutStep::RedeemCoupon),
                Err(err) => {
                    warn!(
                        %transaction,
                        coupon = %coupon.code,
                        error = %reason(&err),
                        "coupon not redeemed"
                    );
                    failed(CheckoutStep::RedeemCoupon, &err)
                }
            },
        };
        steps.push(redeem);

        let close = match self
            .sessions
            .complete(&request.session_code, &transaction)
            .await
        {
            Ok(_) => succeeded(CheckoutStep::CloseSession),
            Err(err) => {
                warn!(
                    %transaction,
                    code = %request.session_code,
                    error = %reason(&err),
                    "session not closed"
                );
                failed(CheckoutStep::CloseSession, &err)
            }
        };
        steps.push(close);

        for line in &request.lines {
            let step = CheckoutStep::DecrementStock(line.product_id.clone());

            let outcome = self
                .ledger
                .decrement(&request.machine_id, &line.product_id, line.quantity, now)
                .await;

            steps.push(match outcome {
                Ok(_) => succeeded(step),
                Err(err) => {
                    error!(
                        %transaction,
                        machine = %request.machine_id,
                        product = %line.product_id,
                        quantity = line.quantity,
                        error = %reason(&err),
                        "stock not decremented"
                    );
                    failed(step, &err)
                }
            });
        }

        let dispense = match self.enqueue_dispense(&request, &receipt).await {
            Ok(()) => succeeded(CheckoutStep::EnqueueDispense),
            Err(err) => {
                error!(%transaction, error = %reason(&err), "dispense not queued");
                failed(CheckoutStep::EnqueueDispense, &err)
            }
        };
        steps.push(dispense);

        let report = CheckoutReport { receipt, steps };

        info!(
            %transaction,
            total = %report.receipt.total_amount,
            failures = report.failures().count(),
            "checkout settled"
        );

        report
    }

    async fn write_receipt(&self, receipt: &TransactionReceipt) -> Result<(), StoreError> {
        let path = StorePath::transaction(&receipt.transaction_id);

        self.store.set(&path, encode(&path, receipt)?).await
    }

    async fn enqueue_dispense(
        &self,
        request: &CheckoutRequest,
        receipt: &TransactionReceipt,
    ) -> Result<(), StoreError> {
        let path = StorePath::dispense(&request.session_code);
        let instruction = DispenseInstruction::for_receipt(receipt);

        self.store.set(&path, encode(&path, &instruction)?).await
    }
}

fn remaining_steps(request: &CheckoutRequest) -> impl Iterator<Item = CheckoutStep> + '_ {
    [CheckoutStep::RedeemCoupon, CheckoutStep::CloseSession]
        .into_iter()
        .chain(
            request
                .lines
                .iter()
                .map(|line| CheckoutStep::DecrementStock(line.product_id.clone())),
        )
        .chain([CheckoutStep::EnqueueDispense])
}

fn succeeded(step: CheckoutStep) -> StepReport {
    StepReport {
        step,
        outcome: StepOutcome::Succeeded,
    }
}

fn skipped(step: CheckoutStep) -> StepReport {
    StepReport {
        step,
        outcome: StepOutcome::Skipped,
    }
}

fn failed(step: CheckoutStep, err: &(dyn StdError + 'static)) -> StepReport {
    StepReport {
        step,
        outcome: StepOutcome::Failed(reason(err)),
    }
}

/// Error message with its sources, `outer: inner: root`.
fn reason(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
