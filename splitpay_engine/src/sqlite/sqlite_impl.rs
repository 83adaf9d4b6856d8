//! `SqliteDatabase` is a concrete implementation of a split payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use splitpay_common::Paise;
use sqlx::{migrate, SqlitePool};

use super::db::{catalog, co_payments, contributors, db_url, new_pool, orders};
use crate::{
    db_types::{
        Cake,
        CoPayment,
        CoPaymentStatus,
        Contributor,
        ContributorTally,
        NewCoPayment,
        Order,
        OrderId,
        OrderItemRecord,
        OrderStatusHistory,
        OrderStatusType,
        PaymentStatusType,
        Vendor,
        SYSTEM_ACTOR,
    },
    traits::{
        CoPaymentRef,
        ConfirmationOutcome,
        ContributorSignal,
        OrderManagement,
        SignalEffect,
        SignalOutcome,
        SignalStatus,
        SplitPaymentDatabase,
        SplitPaymentError,
    },
};

pub const CONFIRMATION_MESSAGE: &str = "Order confirmed. All split payment contributions received.";

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

fn not_found(co_payment: &CoPaymentRef) -> SplitPaymentError {
    match co_payment {
        CoPaymentRef::Id(id) => SplitPaymentError::CoPaymentNotFound(*id),
        CoPaymentRef::Order(oid) => SplitPaymentError::CoPaymentForOrderNotFound(oid.clone()),
    }
}

impl SplitPaymentDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_co_payment(
        &self,
        co_payment: NewCoPayment,
    ) -> Result<(CoPayment, Vec<Contributor>), SplitPaymentError> {
        let order_data = co_payment.snapshot.to_json()?;
        let mut tx = self.pool.begin().await?;
        let record = co_payments::insert_co_payment(
            &co_payment.order_id,
            co_payment.total_amount,
            &co_payment.currency,
            &order_data,
            &mut tx,
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                SplitPaymentError::CoPaymentAlreadyExists(co_payment.order_id.clone())
            },
            e => SplitPaymentError::from(e),
        })?;
        let mut saved = Vec::with_capacity(co_payment.contributors.len());
        for contributor in &co_payment.contributors {
            saved.push(contributors::insert_contributor(record.id, contributor, &mut tx).await?);
        }
        tx.commit().await?;
        info!(
            "🗃️ Co-payment #{} for order {} saved with {} contributors. Total {}",
            record.id,
            record.order_id,
            saved.len(),
            record.total_amount
        );
        Ok((record, saved))
    }

    async fn attach_payment_link(
        &self,
        contributor_id: i64,
        payment_link_id: &str,
        payment_url: &str,
    ) -> Result<Contributor, SplitPaymentError> {
        let mut tx = self.pool.begin().await?;
        match contributors::set_payment_link(contributor_id, payment_link_id, payment_url, &mut tx).await? {
            Some(c) => {
                tx.commit().await?;
                debug!("🗃️ Payment link {payment_link_id} attached to {}", c.label());
                Ok(c)
            },
            None => {
                let existing = contributors::fetch_contributor(contributor_id, &mut tx).await?;
                tx.rollback().await?;
                match existing {
                    None => Err(SplitPaymentError::ContributorNotFound(contributor_id)),
                    Some(c) => Err(SplitPaymentError::ValidationError(format!(
                        "{} is {} with payment link {}. It cannot be replaced.",
                        c.label(),
                        c.status,
                        c.payment_link_id.unwrap_or_default()
                    ))),
                }
            },
        }
    }

    async fn record_link_issue_failure(
        &self,
        contributor_id: i64,
        reason: &str,
    ) -> Result<Contributor, SplitPaymentError> {
        let mut tx = self.pool.begin().await?;
        let contributor = contributors::set_issue_error(contributor_id, reason, &mut tx)
            .await?
            .ok_or(SplitPaymentError::ContributorNotFound(contributor_id))?;
        tx.commit().await?;
        Ok(contributor)
    }

    async fn fetch_co_payment(&self, co_payment: &CoPaymentRef) -> Result<Option<CoPayment>, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        let result = co_payments::fetch_by_ref(co_payment, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_contributors(&self, co_payment_id: i64) -> Result<Vec<Contributor>, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        let result = contributors::fetch_contributors(co_payment_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_contributor(&self, contributor_id: i64) -> Result<Option<Contributor>, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        let result = contributors::fetch_contributor(contributor_id, &mut conn).await?;
        Ok(result)
    }

    async fn apply_contributor_signal(&self, signal: &ContributorSignal) -> Result<SignalOutcome, SplitPaymentError> {
        let mut tx = self.pool.begin().await?;
        let co_payment =
            co_payments::bump_version(&signal.co_payment, &mut tx).await?.ok_or_else(|| not_found(&signal.co_payment))?;
        let id = co_payment.id;
        let contributor = contributors::fetch_contributor_by_link(id, &signal.payment_link_id, &mut tx)
            .await?
            .ok_or_else(|| SplitPaymentError::PaymentLinkNotFound(signal.payment_link_id.clone()))?;
        let (updated, effect) = match signal.status {
            SignalStatus::Paid => (contributors::mark_paid(contributor.id, &mut tx).await?, SignalEffect::ContributorPaid),
            SignalStatus::Failed => {
                (contributors::mark_failed(contributor.id, &mut tx).await?, SignalEffect::ContributorFailed)
            },
        };
        let Some(contributor) = updated else {
            tx.rollback().await?;
            debug!(
                "🗃️ {} signal for {} on co-payment #{id} changes nothing. Rolled back.",
                signal.status,
                contributor.label()
            );
            let mut conn = self.pool.acquire().await?;
            let co_payment = co_payments::fetch_co_payment(id, &mut conn).await?.unwrap_or(co_payment);
            let contributors = contributors::fetch_contributors(id, &mut conn).await?;
            return Ok(SignalOutcome {
                co_payment,
                contributor,
                contributors,
                effect: SignalEffect::NoOp,
                newly_completed: false,
            });
        };
        let all = contributors::fetch_contributors(id, &mut tx).await?;
        let tally = ContributorTally::new(&all);
        let next = co_payment.status.recompute(tally.paid, tally.total);
        trace!("🗃️ Co-payment #{id}: {tally:?}. Status {} -> {next}", co_payment.status);
        let mut newly_completed = false;
        let co_payment = if co_payment.status.is_terminal() {
            if co_payment.status == CoPaymentStatus::Failed && effect == SignalEffect::ContributorPaid {
                warn!(
                    "🗃️ {} paid {} towards co-payment #{id}, which has already been abandoned. This payment needs \
                     to be refunded.",
                    contributor.label(),
                    contributor.amount
                );
            }
            co_payments::update_collected_amount(id, tally.collected, &mut tx).await?
        } else if next == CoPaymentStatus::Completed {
            let completed = co_payments::mark_completed(id, tally.collected, &mut tx).await?.ok_or_else(|| {
                SplitPaymentError::IllegalTransition(format!("Co-payment #{id} could not be marked as completed"))
            })?;
            newly_completed = true;
            completed
        } else {
            co_payments::update_progress(id, next, tally.collected, &mut tx).await?.ok_or_else(|| {
                SplitPaymentError::IllegalTransition(format!("Co-payment #{id} is no longer in progress"))
            })?
        };
        tx.commit().await?;
        debug!(
            "🗃️ {} is now {}. Co-payment #{id} is {} ({}/{} paid, {} collected)",
            contributor.label(),
            contributor.status,
            co_payment.status,
            tally.paid,
            tally.total,
            tally.collected
        );
        Ok(SignalOutcome { co_payment, contributor, contributors: all, effect, newly_completed })
    }

    async fn confirm_order_for_co_payment(
        &self,
        co_payment_id: i64,
    ) -> Result<ConfirmationOutcome, SplitPaymentError> {
        let mut tx = self.pool.begin().await?;
        let Some(co_payment) = co_payments::mark_confirmed(co_payment_id, &mut tx).await? else {
            tx.rollback().await?;
            let mut conn = self.pool.acquire().await?;
            return match co_payments::fetch_co_payment(co_payment_id, &mut conn).await? {
                None => Err(SplitPaymentError::CoPaymentNotFound(co_payment_id)),
                Some(c) if c.is_confirmed() => Err(SplitPaymentError::IllegalTransition(format!(
                    "The order for co-payment #{co_payment_id} has already been confirmed"
                ))),
                Some(c) => Err(SplitPaymentError::IllegalTransition(format!(
                    "Co-payment #{co_payment_id} is {}, not Completed",
                    c.status
                ))),
            };
        };
        let snapshot = co_payment.snapshot()?;
        let order_id = &co_payment.order_id;
        let existing = orders::update_order_status(
            order_id,
            OrderStatusType::Confirmed,
            PaymentStatusType::Completed,
            &mut tx,
        )
        .await?;
        let (order, created) = match existing {
            Some(order) => (order, false),
            None => {
                let order = orders::insert_order_from_draft(
                    order_id,
                    snapshot.draft(),
                    OrderStatusType::Confirmed,
                    PaymentStatusType::Completed,
                    &mut tx,
                )
                .await?;
                (order, true)
            },
        };
        let history = orders::insert_status_history(
            order_id,
            OrderStatusType::Confirmed,
            CONFIRMATION_MESSAGE,
            SYSTEM_ACTOR,
            &mut tx,
        )
        .await?;
        tx.commit().await?;
        info!(
            "🗃️ Order {order_id} {} and confirmed for co-payment #{co_payment_id}",
            if created { "created" } else { "updated" }
        );
        Ok(ConfirmationOutcome { co_payment, order, history, created })
    }

    async fn fetch_unconfirmed_co_payments(&self) -> Result<Vec<CoPayment>, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        let result = co_payments::fetch_unconfirmed(&mut conn).await?;
        Ok(result)
    }

    async fn abandon_co_payment(&self, co_payment_id: i64) -> Result<CoPayment, SplitPaymentError> {
        let mut tx = self.pool.begin().await?;
        if let Some(c) = co_payments::mark_failed(co_payment_id, &mut tx).await? {
            tx.commit().await?;
            info!("🗃️ Co-payment #{co_payment_id} for order {} has been abandoned", c.order_id);
            return Ok(c);
        }
        let existing = co_payments::fetch_co_payment(co_payment_id, &mut tx).await?;
        tx.rollback().await?;
        match existing {
            None => Err(SplitPaymentError::CoPaymentNotFound(co_payment_id)),
            Some(c) => Err(SplitPaymentError::IllegalTransition(format!(
                "Co-payment #{co_payment_id} is {} and cannot be abandoned",
                c.status
            ))),
        }
    }

    async fn close(&mut self) -> Result<(), SplitPaymentError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItemRecord>, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_order_status_history(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<OrderStatusHistory>, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        let history = orders::fetch_status_history(order_id, &mut conn).await?;
        Ok(history)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn insert_vendor(&self, name: &str) -> Result<Vendor, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::insert_vendor(name, &mut conn).await?)
    }

    pub async fn insert_cake(&self, vendor_id: i64, name: &str, price: Paise) -> Result<Cake, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::insert_cake(vendor_id, name, price, &mut conn).await?)
    }

    pub async fn fetch_vendor(&self, id: i64) -> Result<Option<Vendor>, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_vendor(id, &mut conn).await?)
    }

    pub async fn fetch_cake(&self, id: i64) -> Result<Option<Cake>, SplitPaymentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_cake(id, &mut conn).await?)
    }
}
