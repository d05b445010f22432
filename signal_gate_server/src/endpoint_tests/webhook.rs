use actix_web::{test, test::TestRequest, web, App};
use serde_json::{json, Value};

use super::{
    helpers::test_config,
    mocks::{MockGateBackend, StubGateway},
};
use crate::{dispatcher::UpdateDispatcher, routes::WebhookRoute};

async fn post_webhook(backend: MockGateBackend, gateway: StubGateway, body: Value) -> Value {
    let verifier = signal_gate_engine::VerificationApi::new(backend, sg_common::UsdCents::from_dollars(20));
    let dispatcher = UpdateDispatcher::new(verifier, gateway, test_config());
    let app = App::new()
        .app_data(web::Data::new(dispatcher))
        .service(WebhookRoute::<MockGateBackend, StubGateway>::new());
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/webhook").set_json(body).to_request();
    let res = test::call_service(&service, req).await;
    assert!(res.status().is_success(), "the webhook must always be acked with a 200");
    test::read_body_json(res).await
}

#[actix_web::test]
async fn empty_updates_are_acked() {
    let _ = env_logger::try_init().ok();
    let body = post_webhook(MockGateBackend::new(), StubGateway::default(), json!({"update_id": 3})).await;
    assert_eq!(body, json!({"ok": true}));
}

#[actix_web::test]
async fn unknown_callback_payloads_are_acked_and_dropped() {
    let _ = env_logger::try_init().ok();
    let gateway = StubGateway::default();
    let update = json!({
        "update_id": 4,
        "callback_query": {"id": "cb-9", "from": {"id": 55}, "data": "mystery|payload"}
    });
    let body = post_webhook(MockGateBackend::new(), gateway.clone(), update).await;
    assert_eq!(body, json!({"ok": true}));
    // Give the detached task a chance to run before asserting on the recorded traffic.
    tokio::task::yield_now().await;
    assert!(gateway.sent_texts().is_empty());
    assert_eq!(gateway.answered(), vec!["cb-9"]);
}
