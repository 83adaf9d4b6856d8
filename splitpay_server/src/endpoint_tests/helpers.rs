use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use log::debug;
use splitpay_common::Secret;
use splitpay_engine::{events::EventProducers, test_utils::MockGateway, SplitPaymentApi};

use super::mocks::MockSplitPaymentStore;
use crate::{
    config::{ServerOptions, WebhookConfig},
    server::split_payment_routes,
};

pub const WEBHOOK_SECRET: &str = "whsec_cakes_for_everyone";

pub fn webhook_config(hmac_checks: bool) -> WebhookConfig {
    WebhookConfig { hmac_secret: Secret::new(WEBHOOK_SECRET.to_string()), hmac_checks }
}

pub fn api_with(store: MockSplitPaymentStore) -> SplitPaymentApi<MockSplitPaymentStore, MockGateway> {
    SplitPaymentApi::new(store, MockGateway::new(), EventProducers::default())
}

/// Sends the request through the full set of routes and returns the status code and body. Errors raised by
/// middleware are turned into responses the same way the server would.
pub async fn send_request(
    req: TestRequest,
    api: SplitPaymentApi<MockSplitPaymentStore, MockGateway>,
    webhook: WebhookConfig,
) -> (StatusCode, String) {
    let app = App::new()
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(ServerOptions::default()))
        .configure(split_payment_routes::<MockSplitPaymentStore, MockGateway>(webhook));
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
