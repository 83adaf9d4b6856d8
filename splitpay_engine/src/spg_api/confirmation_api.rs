use std::fmt::Debug;

use log::*;

use crate::{
    db_types::CoPayment,
    events::{ConsistencyWarningEvent, EventProducers, OrderConfirmedEvent},
    spg_api::retry::{retry_transient, RetryPolicy},
    traits::{CoPaymentRef, ConfirmationOutcome, SplitPaymentDatabase, SplitPaymentError},
};

/// `OrderConfirmationApi` turns a completed co-payment into a confirmed order.
///
/// Confirmation happens once, in its own transaction, after the signal that completed the co-payment has been
/// committed. If it fails, the co-payment stays `Completed` but unconfirmed, a consistency warning is raised, and an
/// operator can retry with [`Self::confirm`] once the cause has been fixed. Nothing retries automatically.
pub struct OrderConfirmationApi<B> {
    db: B,
    producers: EventProducers,
    retry: RetryPolicy,
}

impl<B> Debug for OrderConfirmationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderConfirmationApi")
    }
}

impl<B> OrderConfirmationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, retry: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl<B> OrderConfirmationApi<B>
where B: SplitPaymentDatabase
{
    /// Confirms the order for the co-payment with the given id. This is the operator's retry path, and is also safe to
    /// call for a co-payment that was never triggered. It fails with `IllegalTransition` if the order has already been
    /// confirmed, and with `ConsistencyWarning` if confirmation fails again.
    pub async fn confirm(&self, co_payment_id: i64) -> Result<ConfirmationOutcome, SplitPaymentError> {
        let co_payment = self
            .db
            .fetch_co_payment(&CoPaymentRef::Id(co_payment_id))
            .await?
            .ok_or(SplitPaymentError::CoPaymentNotFound(co_payment_id))?;
        self.confirm_co_payment(&co_payment).await
    }

    /// Called by the reconciliation flow for the one signal that completed the co-payment. Failures are reported
    /// through logs and the consistency warning hook rather than to the caller, since the signal itself was applied.
    pub(crate) async fn trigger(&self, co_payment: &CoPayment) -> Option<ConfirmationOutcome> {
        debug!("🔄️✅️ Co-payment #{} is complete. Confirming order {}", co_payment.id, co_payment.order_id);
        self.confirm_co_payment(co_payment).await.ok()
    }

    async fn confirm_co_payment(&self, co_payment: &CoPayment) -> Result<ConfirmationOutcome, SplitPaymentError> {
        let id = co_payment.id;
        let result =
            retry_transient("Order confirmation", self.retry, || self.db.confirm_order_for_co_payment(id)).await;
        match result {
            Ok(outcome) => {
                info!(
                    "🔄️✅️ Order {} confirmed for co-payment #{id}. Total {}",
                    outcome.order.order_id, outcome.order.final_amount
                );
                self.call_order_confirmed_hook(&outcome).await;
                Ok(outcome)
            },
            Err(e @ (SplitPaymentError::CoPaymentNotFound(_) | SplitPaymentError::IllegalTransition(_))) => {
                warn!("🔄️✅️ Order for co-payment #{id} was not confirmed. {e}");
                Err(e)
            },
            Err(e) => Err(self.raise_consistency_warning(co_payment, e).await),
        }
    }

    /// All co-payments that completed but whose order was never confirmed.
    pub async fn unconfirmed(&self) -> Result<Vec<CoPayment>, SplitPaymentError> {
        self.db.fetch_unconfirmed_co_payments().await
    }

    async fn raise_consistency_warning(&self, co_payment: &CoPayment, cause: SplitPaymentError) -> SplitPaymentError {
        let reason = cause.to_string();
        error!(
            target: "spg::alert",
            "⚠️ Co-payment #{} for order {} is fully paid, but the order could not be confirmed. It needs manual \
             attention. {reason}",
            co_payment.id,
            co_payment.order_id
        );
        for emitter in &self.producers.consistency_warning_producer {
            let event = ConsistencyWarningEvent::new(co_payment.id, co_payment.order_id.clone(), reason.clone());
            emitter.publish_event(event).await;
        }
        SplitPaymentError::ConsistencyWarning { co_payment_id: co_payment.id, reason }
    }

    async fn call_order_confirmed_hook(&self, outcome: &ConfirmationOutcome) {
        for emitter in &self.producers.order_confirmed_producer {
            debug!("🔄️✅️ Notifying order confirmed hook subscribers");
            let event = OrderConfirmedEvent::new(outcome.co_payment.id, outcome.order.clone(), outcome.created);
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
