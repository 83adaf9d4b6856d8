use actix_web::{http::StatusCode, test::TestRequest};
use splitpay_engine::{
    db_types::CoPaymentStatus,
    traits::{CoPaymentRef, SignalEffect, SignalStatus, SplitPaymentError},
};

use super::{
    helpers::{api_with, json, send_request, webhook_config, WEBHOOK_SECRET},
    mocks::{co_payment, half_paid, signal_outcome, store},
};
use crate::{config::WEBHOOK_SIGNATURE_HEADER, helpers::calculate_hmac};

const PAID: &str = r#"{"co_payment_id":12,"payment_link_id":"plink_0001","status":"paid"}"#;

fn webhook(body: &str, signature: Option<String>) -> TestRequest {
    let mut req = TestRequest::post()
        .uri("/webhook/payment_link")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string());
    if let Some(signature) = signature {
        req = req.insert_header((WEBHOOK_SIGNATURE_HEADER, signature));
    }
    req
}

fn signed(body: &str) -> TestRequest {
    webhook(body, Some(calculate_hmac(WEBHOOK_SECRET, body.as_bytes())))
}

#[actix_web::test]
async fn signed_notifications_are_applied() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal()
        .withf(|s| {
            s.co_payment == CoPaymentRef::Id(12) && s.payment_link_id == "plink_0001" && s.status == SignalStatus::Paid
        })
        .times(1)
        .returning(|_| Ok(signal_outcome(SignalEffect::ContributorPaid)));
    let (status, body) = send_request(signed(PAID), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["success"], true);
}

#[actix_web::test]
async fn notifications_can_name_the_order() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"order_id":"CK20240611-ABC123","payment_link_id":"plink_0002","status":"expired"}"#;
    let mut db = store();
    db.expect_apply_contributor_signal()
        .withf(|s| s.co_payment == CoPaymentRef::Order("CK20240611-ABC123".into()) && s.status == SignalStatus::Failed)
        .times(1)
        .returning(|_| Ok(signal_outcome(SignalEffect::ContributorFailed)));
    let (status, body) = send_request(signed(body), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[actix_web::test]
async fn unsigned_notifications_are_refused() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal().never();
    let (status, _) = send_request(webhook(PAID, None), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn tampered_notifications_are_refused() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal().never();
    let other = r#"{"co_payment_id":12,"payment_link_id":"plink_0001","status":"expired"}"#;
    let signature = calculate_hmac(WEBHOOK_SECRET, other.as_bytes());
    let (status, _) = send_request(webhook(PAID, Some(signature)), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut db = store();
    db.expect_apply_contributor_signal().never();
    let signature = calculate_hmac("whsec_somebody_else", PAID.as_bytes());
    let (status, _) = send_request(webhook(PAID, Some(signature)), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn signature_checks_can_be_switched_off() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal().times(1).returning(|_| Ok(signal_outcome(SignalEffect::NoOp)));
    let (status, body) = send_request(webhook(PAID, None), api_with(db), webhook_config(false)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[actix_web::test]
async fn unknown_links_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal()
        .returning(|s| Err(SplitPaymentError::PaymentLinkNotFound(s.payment_link_id.clone())));
    let (status, body) = send_request(signed(PAID), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK);
    let response = json(&body);
    assert_eq!(response["success"], false);
    assert!(response["message"].as_str().unwrap().contains("plink_0001"), "{body}");
}

#[actix_web::test]
async fn busy_databases_ask_the_gateway_to_retry() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal()
        .returning(|_| Err(SplitPaymentError::TransientDatabaseError("database is locked".into())));
    let (status, _) = send_request(signed(PAID), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn open_links_change_nothing() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal().never();
    let body = r#"{"co_payment_id":12,"payment_link_id":"plink_0001","status":"partially_paid"}"#;
    let (status, body) = send_request(signed(body), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["success"], true);
}

#[actix_web::test]
async fn notifications_must_name_a_co_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal().never();
    let body = r#"{"payment_link_id":"plink_0001","status":"paid"}"#;
    let (status, _) = send_request(signed(body), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn payers_returning_from_the_gateway_see_the_progress() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal()
        .withf(|s| s.co_payment == CoPaymentRef::Id(12) && s.payment_link_id == "plink_0001")
        .times(1)
        .returning(|_| Ok(signal_outcome(SignalEffect::ContributorPaid)));
    let req =
        TestRequest::get().uri("/callback/split_payments/12?payment_link_id=plink_0001&payment_link_status=paid");
    let (status, body) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let snapshot = json(&body);
    assert_eq!(snapshot["status"], "Partial");
    assert_eq!(snapshot["paid_count"], 1);
}

#[actix_web::test]
async fn callbacks_for_open_links_only_report_the_status() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_apply_contributor_signal().never();
    db.expect_fetch_co_payment().returning(|_| Ok(Some(co_payment(12, CoPaymentStatus::Partial))));
    db.expect_fetch_contributors().returning(|_| Ok(half_paid()));
    let req =
        TestRequest::get().uri("/callback/split_payments/12?payment_link_id=plink_0002&payment_link_status=created");
    let (status, body) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["pending_count"], 1);
}
