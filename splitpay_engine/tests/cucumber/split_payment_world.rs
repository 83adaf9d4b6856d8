use cucumber::World;
use log::*;
use splitpay_engine::{
    db_types::{Cake, OrderId, Vendor},
    split_payment_objects::CoPaymentSnapshot,
    test_utils::{
        fixtures::seed_catalog,
        prepare_env::{create_database, random_db_path, run_migrations},
        MockGateway,
    },
    SplitPaymentApi,
    SplitPaymentError,
    SplitPaymentOptions,
    SqliteDatabase,
};
use tokio::time::sleep;

#[derive(Default, Debug, World)]
pub struct SplitPaymentWorld {
    pub system: Option<SplitPaymentSystem>,
    pub last_error: Option<SplitPaymentError>,
}

#[derive(Debug)]
pub struct SplitPaymentSystem {
    pub db_path: String,
    pub api: SplitPaymentApi<SqliteDatabase, MockGateway>,
    pub gateway: MockGateway,
    pub vendor: Vendor,
    pub cake: Cake,
}

impl SplitPaymentWorld {
    pub fn system(&self) -> &SplitPaymentSystem {
        self.system.as_ref().expect("Split payment system not initialised")
    }

    pub fn api(&self) -> &SplitPaymentApi<SqliteDatabase, MockGateway> {
        &self.system().api
    }

    pub async fn status_of(&self, order_id: &str) -> CoPaymentSnapshot {
        self.api()
            .status_for_order(&OrderId::from(order_id))
            .await
            .unwrap_or_else(|e| panic!("No co-payment for order {order_id}. {e}"))
    }

    /// Keeps the error of a request that was expected to fail, so that a later step can inspect it.
    pub fn record<T>(&mut self, result: Result<T, SplitPaymentError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("🚀️ Request failed: {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}

impl SplitPaymentSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        sleep(std::time::Duration::from_millis(50)).await;
        let (vendor, cake) = seed_catalog(&db).await;
        let gateway = MockGateway::new();
        let options =
            SplitPaymentOptions { callback_base_url: Some("https://cakes.example.com".into()), ..Default::default() };
        let api = SplitPaymentApi::with_options(db, gateway.clone(), Default::default(), options);
        Self { db_path: url, api, gateway, vendor, cake }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
