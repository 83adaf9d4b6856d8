use std::fmt::Debug;

use chrono::Utc;
use log::*;
use splitpay_common::{Paise, DEFAULT_CURRENCY_CODE};

use crate::{
    db_types::{CoPayment, Contributor, ContributorStatus, NewCoPayment, NewContributor, OrderId},
    events::{ContributorPaidEvent, EventProducers},
    helpers::{generate_order_number, is_valid_email, normalize_phone},
    order_snapshot::{OrderDraft, OrderSnapshot},
    spg_api::{
        confirmation_api::OrderConfirmationApi,
        retry::{retry_transient, RetryPolicy},
        split_payment_objects::{
            CoPaymentSnapshot,
            LinkIssueResult,
            NewSplitPayment,
            SignalReceipt,
            SplitPaymentCreated,
        },
    },
    traits::{
        CoPaymentRef,
        ContributorSignal,
        Payer,
        PaymentLinkGateway,
        PaymentLinkRequest,
        SignalEffect,
        SplitPaymentDatabase,
        SplitPaymentError,
    },
};

#[derive(Debug, Clone)]
pub struct SplitPaymentOptions {
    /// ISO currency code used for every payment link
    pub currency: String,
    /// The public base URL of this server. When set, payment links redirect payers to
    /// `{callback_base_url}/callback/split_payments/{co_payment_id}` after paying.
    pub callback_base_url: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for SplitPaymentOptions {
    fn default() -> Self {
        Self { currency: DEFAULT_CURRENCY_CODE.to_string(), callback_base_url: None, retry: RetryPolicy::default() }
    }
}

/// `SplitPaymentApi` is the primary API for split payments. It
/// * creates co-payments and issues one payment link per contributor,
/// * folds gateway status signals into contributor and co-payment state, and
/// * hands completed co-payments to the [`OrderConfirmationApi`].
pub struct SplitPaymentApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    options: SplitPaymentOptions,
    confirmation: OrderConfirmationApi<B>,
}

impl<B, G> Debug for SplitPaymentApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SplitPaymentApi ({})", self.options.currency)
    }
}

impl<B: Clone, G> SplitPaymentApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self::with_options(db, gateway, producers, SplitPaymentOptions::default())
    }

    pub fn with_options(db: B, gateway: G, producers: EventProducers, options: SplitPaymentOptions) -> Self {
        let confirmation = OrderConfirmationApi::new(db.clone(), producers.clone()).with_retry_policy(options.retry);
        Self { db, gateway, producers, options, confirmation }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn confirmation(&self) -> &OrderConfirmationApi<B> {
        &self.confirmation
    }
}

impl<B, G> SplitPaymentApi<B, G>
where
    B: SplitPaymentDatabase,
    G: PaymentLinkGateway,
{
    /// Creates a co-payment for the draft order and issues a payment link for every contributor.
    ///
    /// The co-payment and its contributors are stored before any link is requested. A contributor whose link could
    /// not be issued stays `Pending` without a link, and is reported with a "please retry" message. The other
    /// contributors are unaffected. Use [`Self::reissue_payment_link`] to try again for that contributor.
    pub async fn create_split_payment(&self, request: NewSplitPayment) -> Result<SplitPaymentCreated, SplitPaymentError> {
        let NewSplitPayment { order_id, order, contributors } = request;
        let contributors = validate_contributors(contributors)?;
        validate_amounts(&order, &contributors)?;
        let order_id = order_id.unwrap_or_else(generate_order_number);
        if order_id.as_str().trim().is_empty() {
            return Err(SplitPaymentError::ValidationError("The order id may not be empty".into()));
        }
        let new_co_payment = NewCoPayment {
            order_id: order_id.clone(),
            total_amount: order.final_amount,
            currency: self.options.currency.clone(),
            snapshot: OrderSnapshot::from(order),
            contributors,
        };
        let (co_payment, contributors) =
            retry_transient("Create co-payment", self.options.retry, || self.db.insert_co_payment(new_co_payment.clone()))
                .await?;
        info!(
            "🔄️🧁️ Split payment for order {order_id} created as co-payment #{} with {} contributors",
            co_payment.id,
            contributors.len()
        );
        let mut results = Vec::with_capacity(contributors.len());
        for contributor in &contributors {
            results.push(self.issue_link(&co_payment, contributor).await);
        }
        let issued = results.iter().filter(|r| r.is_issued()).count();
        if issued < results.len() {
            warn!(
                "🔄️🧁️ Only {issued} of {} payment links could be issued for co-payment #{}",
                results.len(),
                co_payment.id
            );
        }
        Ok(SplitPaymentCreated {
            co_payment_id: co_payment.id,
            order_id,
            status: co_payment.status,
            currency: co_payment.currency,
            total_amount: co_payment.total_amount,
            contributors: results,
        })
    }

    /// Issues a new payment link for a contributor whose earlier issuance failed, or whose link expired or was
    /// cancelled. In the latter case the contributor goes back to `Pending` once the new link is stored.
    pub async fn reissue_payment_link(
        &self,
        co_payment_id: i64,
        contributor_id: i64,
    ) -> Result<LinkIssueResult, SplitPaymentError> {
        let co_payment = self.fetch_co_payment(&CoPaymentRef::Id(co_payment_id)).await?;
        if co_payment.status.is_terminal() {
            return Err(SplitPaymentError::ValidationError(format!(
                "Co-payment #{co_payment_id} is {}. No more payment links can be issued.",
                co_payment.status
            )));
        }
        let contributor = self
            .db
            .fetch_contributor(contributor_id)
            .await?
            .filter(|c| c.co_payment_id == co_payment_id)
            .ok_or(SplitPaymentError::ContributorNotFound(contributor_id))?;
        if contributor.status == ContributorStatus::Paid {
            return Err(SplitPaymentError::ValidationError(format!("{} has already paid", contributor.label())));
        }
        if !contributor.needs_new_link() {
            return Err(SplitPaymentError::ValidationError(format!(
                "{} already has a payment link",
                contributor.label()
            )));
        }
        let result = self.issue_link(&co_payment, &contributor).await;
        if result.is_issued() {
            Ok(result)
        } else {
            let contributor = self.db.fetch_contributor(contributor_id).await?.unwrap_or(contributor);
            let reason = contributor.last_issue_error.unwrap_or_else(|| "unknown error".to_string());
            Err(SplitPaymentError::UpstreamGatewayError(reason))
        }
    }

    async fn issue_link(&self, co_payment: &CoPayment, contributor: &Contributor) -> LinkIssueResult {
        let request = self.link_request(co_payment, contributor);
        match self.gateway.create_payment_link(request).await {
            Ok(link) => {
                let result = retry_transient("Attach payment link", self.options.retry, || {
                    self.db.attach_payment_link(contributor.id, &link.id, &link.short_url)
                })
                .await;
                match result {
                    Ok(_) => {
                        debug!("🔄️🔗️ Payment link {} issued for {}", link.id, contributor.label());
                        LinkIssueResult::issued(contributor, link.short_url)
                    },
                    Err(e) => {
                        error!(
                            "🔄️🔗️ Payment link {} was issued for {}, but could not be saved. {e}",
                            link.id,
                            contributor.label()
                        );
                        LinkIssueResult::unavailable(contributor)
                    },
                }
            },
            Err(e) => {
                warn!("🔄️🔗️ Could not issue a payment link for {}. {e}", contributor.label());
                if let Err(e2) = self.db.record_link_issue_failure(contributor.id, &e.to_string()).await {
                    error!("🔄️🔗️ Could not record the link issue failure for {}. {e2}", contributor.label());
                }
                LinkIssueResult::unavailable(contributor)
            },
        }
    }

    fn link_request(&self, co_payment: &CoPayment, contributor: &Contributor) -> PaymentLinkRequest {
        let callback_url = self
            .options
            .callback_base_url
            .as_ref()
            .map(|base| format!("{}/callback/split_payments/{}", base.trim_end_matches('/'), co_payment.id));
        PaymentLinkRequest {
            amount: contributor.amount,
            currency: co_payment.currency.clone(),
            payer: Payer {
                name: contributor.name.clone(),
                email: contributor.email.clone(),
                phone: contributor.phone.clone(),
            },
            reference_id: link_reference(co_payment, contributor),
            description: format!("Your share of cake order {}", co_payment.order_id.as_str()),
            callback_url,
        }
    }

    /// Applies a per-contributor status signal. Signals may arrive more than once, from several sources, in any order
    /// and concurrently. A repeated signal changes nothing.
    ///
    /// If this signal is the one that completes the co-payment, the order is confirmed before returning. A failed
    /// confirmation does not fail the signal. It is reported as a consistency warning instead.
    pub async fn process_signal(&self, signal: ContributorSignal) -> Result<SignalReceipt, SplitPaymentError> {
        trace!("🔄️💰️ {} signal for link {} on {}", signal.status, signal.payment_link_id, signal.co_payment);
        let outcome =
            retry_transient("Status signal", self.options.retry, || self.db.apply_contributor_signal(&signal)).await?;
        if outcome.effect == SignalEffect::ContributorPaid {
            self.call_contributor_paid_hook(&outcome.co_payment, &outcome.contributor).await;
        }
        let mut co_payment = outcome.co_payment;
        let mut confirmed_now = false;
        if outcome.newly_completed {
            info!("🔄️💰️ Co-payment #{} for order {} is fully paid", co_payment.id, co_payment.order_id);
            if let Some(confirmation) = self.confirmation.trigger(&co_payment).await {
                co_payment = confirmation.co_payment;
                confirmed_now = true;
            }
        }
        let snapshot = CoPaymentSnapshot::new(&co_payment, &outcome.contributors);
        debug!(
            "🔄️💰️ Co-payment #{} is {} ({}% complete, {} of {} collected)",
            snapshot.co_payment_id,
            snapshot.status,
            snapshot.completion_percentage,
            snapshot.collected_amount,
            snapshot.total_amount
        );
        Ok(SignalReceipt { effect: outcome.effect, completed_now: outcome.newly_completed, confirmed_now, snapshot })
    }

    async fn call_contributor_paid_hook(&self, co_payment: &CoPayment, contributor: &Contributor) {
        for emitter in &self.producers.contributor_paid_producer {
            debug!("🔄️💰️ Notifying contributor paid hook subscribers");
            let event = ContributorPaidEvent::new(co_payment, contributor.clone());
            emitter.publish_event(event).await;
        }
    }

    /// The current state of the co-payment. This is read-only.
    pub async fn status(&self, co_payment: &CoPaymentRef) -> Result<CoPaymentSnapshot, SplitPaymentError> {
        let co_payment = self.fetch_co_payment(co_payment).await?;
        let contributors = self.db.fetch_contributors(co_payment.id).await?;
        Ok(CoPaymentSnapshot::new(&co_payment, &contributors))
    }

    pub async fn status_for_order(&self, order_id: &OrderId) -> Result<CoPaymentSnapshot, SplitPaymentError> {
        self.status(&CoPaymentRef::Order(order_id.clone())).await
    }

    /// Gives up on a co-payment that has not completed. Payments that arrive afterwards are still recorded, but the
    /// co-payment stays `Failed` and the order is never confirmed.
    pub async fn abandon(&self, co_payment_id: i64) -> Result<CoPaymentSnapshot, SplitPaymentError> {
        let co_payment =
            retry_transient("Abandon co-payment", self.options.retry, || self.db.abandon_co_payment(co_payment_id))
                .await?;
        warn!("🔄️🧁️ Co-payment #{co_payment_id} for order {} has been abandoned", co_payment.order_id);
        let contributors = self.db.fetch_contributors(co_payment_id).await?;
        Ok(CoPaymentSnapshot::new(&co_payment, &contributors))
    }

    async fn fetch_co_payment(&self, co_payment: &CoPaymentRef) -> Result<CoPayment, SplitPaymentError> {
        self.db.fetch_co_payment(co_payment).await?.ok_or_else(|| match co_payment {
            CoPaymentRef::Id(id) => SplitPaymentError::CoPaymentNotFound(*id),
            CoPaymentRef::Order(oid) => SplitPaymentError::CoPaymentForOrderNotFound(oid.clone()),
        })
    }
}

/// Trims names, checks contact details and normalises phone numbers.
fn validate_contributors(contributors: Vec<NewContributor>) -> Result<Vec<NewContributor>, SplitPaymentError> {
    if contributors.is_empty() {
        return Err(SplitPaymentError::ValidationError("A split payment needs at least one contributor".into()));
    }
    contributors
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let n = i + 1;
            let name = c.name.trim().to_string();
            if name.is_empty() {
                return Err(SplitPaymentError::ValidationError(format!("Contributor {n} has no name")));
            }
            let email = c.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty());
            if let Some(email) = &email {
                if !is_valid_email(email) {
                    return Err(SplitPaymentError::ValidationError(format!(
                        "Contributor {n} ({name}) has an invalid email address"
                    )));
                }
            }
            let phone = match c.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
                Some(p) => Some(normalize_phone(p).ok_or_else(|| {
                    SplitPaymentError::ValidationError(format!("Contributor {n} ({name}) has an invalid phone number"))
                })?),
                None => None,
            };
            if email.is_none() && phone.is_none() {
                return Err(SplitPaymentError::ValidationError(format!(
                    "Contributor {n} ({name}) needs an email address or a phone number"
                )));
            }
            if !c.amount.is_positive() {
                return Err(SplitPaymentError::ValidationError(format!(
                    "Contributor {n} ({name}) must pay a positive amount, not {}",
                    c.amount
                )));
            }
            Ok(NewContributor { name, email, phone, amount: c.amount })
        })
        .collect()
}

/// Gateways expect a fresh reference for every link, so a replacement link gets a timestamp suffix.
fn link_reference(co_payment: &CoPayment, contributor: &Contributor) -> String {
    let reference = format!("{}-{}", co_payment.order_id.as_str(), contributor.id);
    if contributor.has_link() {
        format!("{reference}-{}", Utc::now().timestamp())
    } else {
        reference
    }
}

fn validate_amounts(order: &OrderDraft, contributors: &[NewContributor]) -> Result<(), SplitPaymentError> {
    order.validate().map_err(|e| SplitPaymentError::ValidationError(e.to_string()))?;
    let sum = Paise::checked_sum(contributors.iter().map(|c| c.amount)).ok_or_else(|| {
        SplitPaymentError::ValidationError(format!(
            "The contributions are too large to add up. The order total is {}",
            order.final_amount
        ))
    })?;
    if sum != order.final_amount {
        return Err(SplitPaymentError::ValidationError(format!(
            "The contributions add up to {sum}, but the order total is {}",
            order.final_amount
        )));
    }
    Ok(())
}
