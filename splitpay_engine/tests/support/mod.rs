#![allow(dead_code)]
use std::{future::Future, time::Duration};

use log::*;
use splitpay_common::Paise;
use splitpay_engine::{
    db_types::{Cake, NewContributor, Vendor},
    events::EventProducers,
    split_payment_objects::{NewSplitPayment, SplitPaymentCreated},
    test_utils::{
        fixtures::{cake_order, seed_catalog},
        prepare_env::drop_database,
        prepare_test_env,
        random_db_path,
        MockGateway,
    },
    SplitPaymentApi,
    SplitPaymentDatabase,
    SplitPaymentOptions,
    SqliteDatabase,
};

pub type TestApi = SplitPaymentApi<SqliteDatabase, MockGateway>;

pub struct TestSystem {
    pub url: String,
    pub api: TestApi,
    pub gateway: MockGateway,
    pub vendor: Vendor,
    pub cake: Cake,
}

pub async fn setup() -> TestSystem {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> TestSystem {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let (vendor, cake) = seed_catalog(&db).await;
    let gateway = MockGateway::new();
    let options =
        SplitPaymentOptions { callback_base_url: Some("https://cakes.example.com/".into()), ..Default::default() };
    let api = SplitPaymentApi::with_options(db, gateway.clone(), producers, options);
    TestSystem { url, api, gateway, vendor, cake }
}

pub async fn tear_down(mut system: TestSystem) {
    if let Err(e) = system.api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    drop_database(&system.url).await;
}

impl TestSystem {
    /// A split payment for a cake costing the sum of `shares`, with one contributor per share.
    pub fn split_payment(&self, shares: &[(&str, i64)]) -> NewSplitPayment {
        let contributors = shares
            .iter()
            .map(|(name, rupees)| {
                let email = format!("{}@example.com", name.to_lowercase());
                NewContributor::with_email(name.to_string(), email, Paise::from_rupees(*rupees))
            })
            .collect::<Vec<_>>();
        let total = shares.iter().map(|(_, r)| Paise::from_rupees(*r)).sum();
        NewSplitPayment::new(cake_order(self.vendor.id, self.cake.id, total), contributors)
    }

    pub async fn create(&self, shares: &[(&str, i64)]) -> SplitPaymentCreated {
        self.api.create_split_payment(self.split_payment(shares)).await.expect("Error creating split payment")
    }

    /// The payment link id issued to the contributor with the given name.
    pub async fn link_for(&self, co_payment_id: i64, name: &str) -> String {
        let contributors = self.api.db().fetch_contributors(co_payment_id).await.expect("Error fetching contributors");
        contributors
            .into_iter()
            .find(|c| c.name == name)
            .and_then(|c| c.payment_link_id)
            .unwrap_or_else(|| panic!("{name} has no payment link"))
    }
}

/// Polls `check` until it returns true, for up to two seconds. Event hooks run on their own tasks.
pub async fn wait_for<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..40 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
