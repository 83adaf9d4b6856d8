use chrono::Utc;
use mockall::mock;
use splitpay_engine::{
    db_types::{
        CoPayment,
        CoPaymentStatus,
        Contributor,
        ContributorStatus,
        NewCoPayment,
        Order,
        OrderId,
        OrderItemRecord,
        OrderStatusHistory,
        Paise,
    },
    traits::{
        CoPaymentRef,
        ConfirmationOutcome,
        ContributorSignal,
        OrderManagement,
        SignalEffect,
        SignalOutcome,
        SplitPaymentDatabase,
        SplitPaymentError,
    },
};

mock! {
    pub SplitPaymentStore {}
    impl Clone for SplitPaymentStore {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for SplitPaymentStore {
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, SplitPaymentError>;
        async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItemRecord>, SplitPaymentError>;
        async fn fetch_order_status_history(&self, order_id: &OrderId) -> Result<Vec<OrderStatusHistory>, SplitPaymentError>;
    }
    impl SplitPaymentDatabase for SplitPaymentStore {
        fn url(&self) -> &str;
        async fn insert_co_payment(&self, co_payment: NewCoPayment) -> Result<(CoPayment, Vec<Contributor>), SplitPaymentError>;
        async fn attach_payment_link(&self, contributor_id: i64, payment_link_id: &str, payment_url: &str) -> Result<Contributor, SplitPaymentError>;
        async fn record_link_issue_failure(&self, contributor_id: i64, reason: &str) -> Result<Contributor, SplitPaymentError>;
        async fn fetch_co_payment(&self, co_payment: &CoPaymentRef) -> Result<Option<CoPayment>, SplitPaymentError>;
        async fn fetch_contributors(&self, co_payment_id: i64) -> Result<Vec<Contributor>, SplitPaymentError>;
        async fn fetch_contributor(&self, contributor_id: i64) -> Result<Option<Contributor>, SplitPaymentError>;
        async fn apply_contributor_signal(&self, signal: &ContributorSignal) -> Result<SignalOutcome, SplitPaymentError>;
        async fn confirm_order_for_co_payment(&self, co_payment_id: i64) -> Result<ConfirmationOutcome, SplitPaymentError>;
        async fn fetch_unconfirmed_co_payments(&self) -> Result<Vec<CoPayment>, SplitPaymentError>;
        async fn abandon_co_payment(&self, co_payment_id: i64) -> Result<CoPayment, SplitPaymentError>;
        async fn close(&mut self) -> Result<(), SplitPaymentError>;
    }
}

/// A store whose clones (handed to the order confirmation API) expect nothing.
pub fn store() -> MockSplitPaymentStore {
    let mut store = MockSplitPaymentStore::new();
    store.expect_clone().returning(MockSplitPaymentStore::new);
    store
}

pub fn co_payment(id: i64, status: CoPaymentStatus) -> CoPayment {
    let now = Utc::now();
    CoPayment {
        id,
        order_id: OrderId::from("CK20240611-ABC123"),
        total_amount: Paise::from_rupees(500),
        collected_amount: Paise::default(),
        currency: "INR".into(),
        status,
        order_data: "{}".into(),
        version: 1,
        created_at: now,
        updated_at: now,
        completed_at: None,
        confirmed_at: None,
    }
}

pub fn contributor(id: i64, name: &str, rupees: i64, status: ContributorStatus) -> Contributor {
    let now = Utc::now();
    let link = format!("plink_{id:04}");
    Contributor {
        id,
        co_payment_id: 12,
        name: name.into(),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        phone: None,
        amount: Paise::from_rupees(rupees),
        status,
        payment_url: Some(format!("https://pay.example.com/{link}")),
        payment_link_id: Some(link),
        last_issue_error: None,
        paid_at: (status == ContributorStatus::Paid).then_some(now),
        created_at: now,
        updated_at: now,
    }
}

/// Asha (300) has paid, Ravi (200) has not.
pub fn half_paid() -> Vec<Contributor> {
    vec![contributor(1, "Asha", 300, ContributorStatus::Paid), contributor(2, "Ravi", 200, ContributorStatus::Pending)]
}

pub fn signal_outcome(effect: SignalEffect) -> SignalOutcome {
    let contributors = half_paid();
    SignalOutcome {
        co_payment: co_payment(12, CoPaymentStatus::Partial),
        contributor: contributors[0].clone(),
        contributors,
        effect,
        newly_completed: false,
    }
}
