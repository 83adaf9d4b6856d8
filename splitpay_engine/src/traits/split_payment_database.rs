use thiserror::Error;

use crate::{
    db_types::{CoPayment, Contributor, NewCoPayment, OrderId},
    order_snapshot::SnapshotError,
    traits::{
        data_objects::{CoPaymentRef, ConfirmationOutcome, ContributorSignal, SignalOutcome},
        OrderManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the split payment engine.
///
/// Every method that mutates state does so in a single atomic transaction. Methods never call out to the payment
/// gateway; that is the job of [`crate::SplitPaymentApi`].
#[allow(async_fn_in_trait)]
pub trait SplitPaymentDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new co-payment aggregate, its order snapshot and its contributor rows in one transaction.
    ///
    /// Fails with [`SplitPaymentError::CoPaymentAlreadyExists`] if there is already a co-payment for the order.
    async fn insert_co_payment(
        &self,
        co_payment: NewCoPayment,
    ) -> Result<(CoPayment, Vec<Contributor>), SplitPaymentError>;

    /// Records the payment link that the gateway issued for a contributor, and clears any previous issuance error.
    ///
    /// A contributor without a link gets one. A `Failed` contributor (whose link expired or was cancelled) has the
    /// dead link replaced and becomes `Pending` again. Anyone else is refused with a validation error.
    async fn attach_payment_link(
        &self,
        contributor_id: i64,
        payment_link_id: &str,
        payment_url: &str,
    ) -> Result<Contributor, SplitPaymentError>;

    /// Records why link issuance failed for a contributor. The contributor's status and link are left alone.
    async fn record_link_issue_failure(&self, contributor_id: i64, reason: &str)
        -> Result<Contributor, SplitPaymentError>;

    async fn fetch_co_payment(&self, co_payment: &CoPaymentRef) -> Result<Option<CoPayment>, SplitPaymentError>;

    async fn fetch_contributors(&self, co_payment_id: i64) -> Result<Vec<Contributor>, SplitPaymentError>;

    async fn fetch_contributor(&self, contributor_id: i64) -> Result<Option<Contributor>, SplitPaymentError>;

    /// Folds a single gateway status signal into the contributor and co-payment state.
    ///
    /// In one transaction:
    /// * The co-payment row's version is bumped. This takes the write lock before anything is read, so concurrent
    ///   signals for the same co-payment are applied one after the other.
    /// * The contributor owning `payment_link_id` is updated (`Paid` or `Failed`). Signals that change nothing roll the
    ///   transaction back, leaving the stored state untouched.
    /// * The paid, pending and failed counts are recomputed from the contributor rows and the aggregate status is
    ///   derived from them. The `Completed` transition is a conditional write on `completed_at IS NULL`, and
    ///   [`SignalOutcome::newly_completed`] is true only for the signal whose write succeeded.
    ///
    /// Fails with [`SplitPaymentError::PaymentLinkNotFound`] if the link does not belong to the co-payment.
    async fn apply_contributor_signal(&self, signal: &ContributorSignal) -> Result<SignalOutcome, SplitPaymentError>;

    /// Confirms the order for a completed co-payment.
    ///
    /// In one transaction, the order is created from the co-payment snapshot (or, if it already exists, its status is
    /// set to `Confirmed` and its payment status to `Completed`), a status history entry is appended and
    /// `confirmed_at` is set with a conditional write on `confirmed_at IS NULL`.
    ///
    /// ## Failure modes:
    /// * [`SplitPaymentError::IllegalTransition`] if the co-payment is not `Completed`, or has already been confirmed.
    /// * [`SplitPaymentError::InvalidSnapshot`] if the order snapshot cannot be decoded.
    /// * [`SplitPaymentError::DatabaseError`] if the order cannot be written (e.g. the vendor no longer exists).
    async fn confirm_order_for_co_payment(&self, co_payment_id: i64)
        -> Result<ConfirmationOutcome, SplitPaymentError>;

    /// All co-payments that are `Completed`, but for which the order was never confirmed.
    async fn fetch_unconfirmed_co_payments(&self) -> Result<Vec<CoPayment>, SplitPaymentError>;

    /// Moves a `Pending` or `Partial` co-payment to `Failed`. This is the only way into the `Failed` status.
    async fn abandon_co_payment(&self, co_payment_id: i64) -> Result<CoPayment, SplitPaymentError>;

    /// Closes the database connection pool.
    async fn close(&mut self) -> Result<(), SplitPaymentError>;
}

#[derive(Debug, Clone, Error)]
pub enum SplitPaymentError {
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("Co-payment {0} does not exist")]
    CoPaymentNotFound(i64),
    #[error("There is no co-payment for order {0}")]
    CoPaymentForOrderNotFound(OrderId),
    #[error("Contributor {0} does not exist")]
    ContributorNotFound(i64),
    #[error("Payment link {0} does not belong to this co-payment")]
    PaymentLinkNotFound(String),
    #[error("A co-payment already exists for order {0}")]
    CoPaymentAlreadyExists(OrderId),
    #[error("The payment gateway could not issue a payment link. {0}")]
    UpstreamGatewayError(String),
    #[error("Co-payment {co_payment_id} is complete, but the order could not be confirmed. {reason}")]
    ConsistencyWarning { co_payment_id: i64, reason: String },
    #[error("{0}")]
    InvalidSnapshot(#[from] SnapshotError),
    #[error("Illegal status change. {0}")]
    IllegalTransition(String),
    #[error("The database is busy. Try again. {0}")]
    TransientDatabaseError(String),
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
}

impl SplitPaymentError {
    /// True if retrying the whole operation might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientDatabaseError(_))
    }
}

/// SQLite reports contention as `SQLITE_BUSY` (5) or `SQLITE_LOCKED` (6). sqlx surfaces the extended result code,
/// whose low byte is the primary code.
fn is_transient_sqlx_error(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| matches!(code & 0xff, 5 | 6))
            .unwrap_or(false),
        _ => false,
    }
}

impl From<sqlx::Error> for SplitPaymentError {
    fn from(e: sqlx::Error) -> Self {
        if is_transient_sqlx_error(&e) {
            SplitPaymentError::TransientDatabaseError(e.to_string())
        } else {
            SplitPaymentError::DatabaseError(e.to_string())
        }
    }
}
