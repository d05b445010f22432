use actix_web::{test, test::TestRequest, web, App};
use chrono::Utc;
use serde_json::Value;
use sg_common::{Secret, UsdCents};
use signal_gate_engine::{
    db_types::{EventKind, LedgerRecord, PostbackOutcome, PostbackStatus},
    traits::SignalGateError,
    PostbackApi,
};

use super::mocks::MockGateBackend;
use crate::{
    data_objects::PostbackAuth,
    routes::PostbackRoute,
};

fn ledger_record(account_id: &str, total: UsdCents) -> LedgerRecord {
    LedgerRecord {
        account_id: account_id.into(),
        total_deposit: total,
        registered: true,
        last_event_amount: total,
        last_event_kind: EventKind::FirstDeposit,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn call_postback(backend: MockGateBackend, auth: PostbackAuth, uri: &str) -> Value {
    let api = PostbackApi::new(backend);
    let app = App::new()
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(auth))
        .service(PostbackRoute::<MockGateBackend>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::get().uri(uri).to_request();
    let res = test::call_service(&service, req).await;
    assert!(res.status().is_success(), "postbacks must always be acked with a 200");
    test::read_body_json(res).await
}

#[actix_web::test]
async fn malformed_amount_defaults_to_zero() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockGateBackend::new();
    backend
        .expect_process_deposit_event()
        .withf(|event| event.account_id.as_str() == "123456" && event.amount == UsdCents::default())
        .returning(|event| {
            Ok(PostbackOutcome {
                status: PostbackStatus::Registered,
                record: ledger_record(event.account_id.as_str(), event.amount),
            })
        });

    let body = call_postback(backend, PostbackAuth::default(), "/postback?account_id=123456&amount=junk&event_kind=reg")
        .await;
    assert_eq!(body["status"], "registered");
    assert_eq!(body["account_id"], "123456");
}

#[actix_web::test]
async fn missing_account_id_is_a_200_error() {
    let _ = env_logger::try_init().ok();
    // No expectations: the backend must not be touched.
    let backend = MockGateBackend::new();
    let body = call_postback(backend, PostbackAuth::default(), "/postback?amount=10&event_kind=dep").await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "missing account_id");
}

#[actix_web::test]
async fn unknown_event_kinds_are_ignored() {
    let _ = env_logger::try_init().ok();
    let backend = MockGateBackend::new();
    let body =
        call_postback(backend, PostbackAuth::default(), "/postback?account_id=123456&event_kind=cashback").await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "ignored");
}

#[actix_web::test]
async fn updated_totals_are_reported() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockGateBackend::new();
    backend.expect_process_deposit_event().returning(|event| {
        Ok(PostbackOutcome {
            status: PostbackStatus::Updated,
            record: ledger_record(event.account_id.as_str(), UsdCents::from_dollars(25)),
        })
    });
    let body = call_postback(
        backend,
        PostbackAuth::default(),
        "/postback?account_id=123456&amount=15&event_kind=dep&event_id=evt-9",
    )
    .await;
    assert_eq!(body["status"], "updated");
    assert_eq!(body["total_deposit"], 2500);
}

#[actix_web::test]
async fn negative_amounts_are_refused_with_a_200_error() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockGateBackend::new();
    backend
        .expect_process_deposit_event()
        .withf(|event| event.amount == UsdCents::from(-500))
        .returning(|event| Err(SignalGateError::NegativeAmount(event.amount)));

    let body =
        call_postback(backend, PostbackAuth::default(), "/postback?account_id=123456&amount=-5&event_kind=dep").await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Negative deposit amount: $-5.00");
}

#[actix_web::test]
async fn a_configured_token_is_enforced() {
    let _ = env_logger::try_init().ok();
    let auth = PostbackAuth::new(Some(Secret::new("hunter2")));
    let backend = MockGateBackend::new();
    let body = call_postback(backend, auth.clone(), "/postback?account_id=123456&event_kind=reg&token=wrong").await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "invalid token");

    let mut backend = MockGateBackend::new();
    backend.expect_process_deposit_event().returning(|event| {
        Ok(PostbackOutcome {
            status: PostbackStatus::Registered,
            record: ledger_record(event.account_id.as_str(), UsdCents::default()),
        })
    });
    let body = call_postback(backend, auth, "/postback?account_id=123456&event_kind=reg&token=hunter2").await;
    assert_eq!(body["status"], "registered");
}
