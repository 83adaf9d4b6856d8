use actix_web::{http::StatusCode, test::TestRequest};
use splitpay_engine::{
    db_types::{CoPaymentStatus, ContributorStatus, NewContributor, OrderId, Paise},
    split_payment_objects::NewSplitPayment,
    test_utils::fixtures::cake_order,
    traits::{CoPaymentRef, SplitPaymentError},
};

use super::{
    helpers::{api_with, json, send_request, webhook_config},
    mocks::{co_payment, contributor, half_paid, store, MockSplitPaymentStore},
};

fn split_request(shares: &[(&str, i64)], rupees: i64) -> String {
    let contributors = shares
        .iter()
        .map(|(name, amount)| {
            NewContributor::with_email(name.to_string(), format!("{}@example.com", name.to_lowercase()), Paise::from_rupees(*amount))
        })
        .collect();
    let request = NewSplitPayment::new(cake_order(1, 1, Paise::from_rupees(rupees)), contributors)
        .with_order_id(OrderId::from("CK20240611-ABC123"));
    serde_json::to_string(&request).unwrap()
}

fn post_json(uri: &str, body: String) -> TestRequest {
    TestRequest::post().uri(uri).insert_header(("Content-Type", "application/json")).set_payload(body)
}

#[actix_web::test]
async fn create_split_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_insert_co_payment().times(1).returning(|new| {
        assert_eq!(new.order_id.as_str(), "CK20240611-ABC123");
        assert_eq!(new.total_amount, Paise::from_rupees(500));
        let contributors = half_paid()
            .into_iter()
            .map(|mut c| {
                c.status = ContributorStatus::Pending;
                c.payment_link_id = None;
                c.payment_url = None;
                c.paid_at = None;
                c
            })
            .collect();
        Ok((co_payment(12, CoPaymentStatus::Pending), contributors))
    });
    db.expect_attach_payment_link().times(2).returning(|id, link, url| {
        let mut c = contributor(id, "Someone", 100, ContributorStatus::Pending);
        c.payment_link_id = Some(link.to_string());
        c.payment_url = Some(url.to_string());
        Ok(c)
    });
    let req = post_json("/api/split_payments", split_request(&[("Asha", 300), ("Ravi", 200)], 500));
    let (status, body) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let created = json(&body);
    assert_eq!(created["co_payment_id"], 12);
    assert_eq!(created["order_id"], "CK20240611-ABC123");
    let contributors = created["contributors"].as_array().unwrap();
    assert_eq!(contributors.len(), 2);
    assert!(contributors.iter().all(|c| c["payment_url"].as_str().unwrap().starts_with("https://pay.example.com/")));
}

#[actix_web::test]
async fn shares_must_add_up_to_the_order_total() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_insert_co_payment().never();
    let req = post_json("/api/split_payments", split_request(&[("Asha", 300), ("Ravi", 150)], 500));
    let (status, body) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("add up to"), "{body}");
}

#[actix_web::test]
async fn one_split_payment_per_order() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_insert_co_payment()
        .returning(|new| Err(SplitPaymentError::CoPaymentAlreadyExists(new.order_id)));
    db.expect_attach_payment_link().never();
    let req = post_json("/api/split_payments", split_request(&[("Asha", 500)], 500));
    let (status, _) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn split_payment_status() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_fetch_co_payment()
        .withf(|r| *r == CoPaymentRef::Id(12))
        .returning(|_| Ok(Some(co_payment(12, CoPaymentStatus::Partial))));
    db.expect_fetch_contributors().withf(|id| *id == 12).returning(|_| Ok(half_paid()));
    let (status, body) =
        send_request(TestRequest::get().uri("/api/split_payments/12"), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let snapshot = json(&body);
    assert_eq!(snapshot["co_payment_id"], 12);
    assert_eq!(snapshot["paid_count"], 1);
    assert_eq!(snapshot["pending_count"], 1);
    assert_eq!(snapshot["contributors"].as_array().unwrap().len(), 2);
    assert_eq!(snapshot["confirmed"], false);
}

#[actix_web::test]
async fn split_payment_status_for_order() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_fetch_co_payment()
        .withf(|r| *r == CoPaymentRef::Order(OrderId::from("CK20240611-ABC123")))
        .returning(|_| Ok(Some(co_payment(12, CoPaymentStatus::Partial))));
    db.expect_fetch_contributors().returning(|_| Ok(half_paid()));
    let req = TestRequest::get().uri("/api/split_payments/order/CK20240611-ABC123");
    let (status, body) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["order_id"], "CK20240611-ABC123");
}

#[actix_web::test]
async fn unknown_split_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_fetch_co_payment().returning(|_| Ok(None));
    let (status, body) =
        send_request(TestRequest::get().uri("/api/split_payments/404"), api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json(&body)["error"].as_str().is_some());
}

#[actix_web::test]
async fn unconfirmed_split_payments() {
    let _ = env_logger::try_init().ok();
    let mut db = MockSplitPaymentStore::new();
    db.expect_clone().returning(|| {
        let mut confirmations = MockSplitPaymentStore::new();
        confirmations.expect_fetch_unconfirmed_co_payments().returning(|| {
            let mut stuck = co_payment(7, CoPaymentStatus::Completed);
            stuck.completed_at = Some(chrono::Utc::now());
            Ok(vec![stuck])
        });
        confirmations
    });
    db.expect_fetch_co_payment().never();
    let req = TestRequest::get().uri("/api/split_payments/unconfirmed");
    let (status, body) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let list = json(&body);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], 7);
}

#[actix_web::test]
async fn confirming_twice_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockSplitPaymentStore::new();
    db.expect_clone().returning(|| {
        let mut confirmations = MockSplitPaymentStore::new();
        confirmations.expect_fetch_co_payment().returning(|_| {
            let mut done = co_payment(7, CoPaymentStatus::Completed);
            done.confirmed_at = Some(chrono::Utc::now());
            Ok(Some(done))
        });
        confirmations
            .expect_confirm_order_for_co_payment()
            .returning(|_| Err(SplitPaymentError::IllegalTransition("Already confirmed".into())));
        confirmations
    });
    let req = TestRequest::post().uri("/api/split_payments/7/confirm");
    let (status, _) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn abandon_split_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_abandon_co_payment().withf(|id| *id == 12).returning(|_| Ok(co_payment(12, CoPaymentStatus::Failed)));
    db.expect_fetch_contributors().returning(|_| Ok(half_paid()));
    let req = TestRequest::post().uri("/api/split_payments/12/abandon");
    let (status, body) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "Failed");
}

#[actix_web::test]
async fn completed_split_payments_cannot_be_abandoned() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_abandon_co_payment()
        .returning(|_| Err(SplitPaymentError::IllegalTransition("Co-payment #12 is Completed".into())));
    let req = TestRequest::post().uri("/api/split_payments/12/abandon");
    let (status, _) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn paid_contributors_do_not_get_new_links() {
    let _ = env_logger::try_init().ok();
    let mut db = store();
    db.expect_fetch_co_payment().returning(|_| Ok(Some(co_payment(12, CoPaymentStatus::Partial))));
    db.expect_fetch_contributor().returning(|_| Ok(Some(contributor(1, "Asha", 300, ContributorStatus::Paid))));
    db.expect_attach_payment_link().never();
    let req = TestRequest::post().uri("/api/split_payments/12/contributors/1/reissue");
    let (status, body) = send_request(req, api_with(db), webhook_config(true)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("already paid"), "{body}");
}
