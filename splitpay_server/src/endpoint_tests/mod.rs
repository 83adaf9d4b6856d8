mod helpers;
mod mocks;
mod split_payments;
mod webhooks;

use actix_web::{http::StatusCode, test::TestRequest};

use self::{
    helpers::{api_with, send_request, webhook_config},
    mocks::store,
};

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/health"), api_with(store()), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}
