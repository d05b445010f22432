use mockall::predicate::eq;

use super::{
    helpers::{callback_update, dispatcher, test_config, text_update},
    mocks::{access_record, MockGateBackend, StubGateway},
};
use crate::replies;

#[tokio::test]
async fn instrument_selection_is_denied_without_access() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockGateBackend::new();
    backend.expect_fetch_access_record().with(eq(55)).returning(|_| Ok(None));
    let gateway = StubGateway::default();
    let dispatcher = dispatcher(backend, gateway.clone(), test_config());

    dispatcher.handle_update(text_update(55, "EUR/USD")).await;

    let sent = gateway.sent_texts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], replies::NOT_VERIFIED);
}

#[tokio::test]
async fn verified_submission_never_reads_the_ledger() {
    let _ = env_logger::try_init().ok();
    tokio::time::pause();
    let mut backend = MockGateBackend::new();
    // The only expectation: an unexpected ledger call panics the mock, which is the point of this test.
    backend.expect_fetch_access_record().with(eq(55)).returning(|id| Ok(Some(access_record(id, "123456"))));
    let gateway = StubGateway::default();
    let dispatcher = dispatcher(backend, gateway.clone(), test_config());

    dispatcher.handle_update(text_update(55, "123456")).await;

    let edits = gateway.edit_texts();
    assert!(edits.last().unwrap().contains("already verified"));
    // The follow-up message offers the instrument menu.
    assert_eq!(gateway.sent_texts().last().unwrap(), replies::PICK_INSTRUMENT);
}

#[tokio::test]
async fn delayed_mode_queues_the_check() {
    let _ = env_logger::try_init().ok();
    tokio::time::pause();
    let mut backend = MockGateBackend::new();
    backend
        .expect_enqueue_verification()
        .withf(|check| check.chat_user_id == 55 && check.account_id.as_str() == "654321")
        .returning(|_| Ok(5));
    let gateway = StubGateway::default();
    let mut config = test_config();
    config.check_delay_secs = 60;
    let dispatcher = dispatcher(backend, gateway.clone(), config);

    dispatcher.handle_update(text_update(55, "654321")).await;

    assert_eq!(gateway.edit_texts().last().unwrap(), &replies::check_queued(60));
}

#[tokio::test]
async fn admin_commands_are_restricted() {
    let _ = env_logger::try_init().ok();
    let backend = MockGateBackend::new();
    let gateway = StubGateway::default();
    let dispatcher = dispatcher(backend, gateway.clone(), test_config());

    dispatcher.handle_update(text_update(55, "/add 77 123456")).await;
    dispatcher.handle_update(text_update(55, "/revoke 77")).await;

    assert_eq!(gateway.sent_texts(), vec![replies::ADMIN_ONLY, replies::ADMIN_ONLY]);
}

#[tokio::test]
async fn admins_can_grant_and_revoke() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockGateBackend::new();
    backend
        .expect_upsert_access_record()
        .withf(|r| r.chat_user_id == 77 && r.account_id.as_str() == "123456")
        .returning(|r| Ok(access_record(r.chat_user_id, r.account_id.as_str())));
    backend.expect_revoke_access().with(eq(77)).returning(|_| Ok(true));
    let gateway = StubGateway::default();
    let dispatcher = dispatcher(backend, gateway.clone(), test_config());

    dispatcher.handle_update(text_update(1000, "/add 77 123456")).await;
    dispatcher.handle_update(text_update(1000, "/revoke 77")).await;

    let sent = gateway.sent_texts();
    assert!(sent[0].contains("77"));
    assert_eq!(sent[1], replies::access_revoked(77));
}

#[tokio::test]
async fn signal_callbacks_are_gated() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockGateBackend::new();
    backend.expect_fetch_access_record().with(eq(55)).returning(|_| Ok(None));
    let gateway = StubGateway::default();
    let dispatcher = dispatcher(backend, gateway.clone(), test_config());

    dispatcher.handle_update(callback_update(55, "signal|EUR/USD|1 min")).await;

    assert_eq!(gateway.answered(), vec!["cb-1"]);
    assert_eq!(gateway.sent_texts(), vec![replies::NOT_VERIFIED.to_string()]);
}

#[tokio::test]
async fn malformed_admin_args_get_usage_help() {
    let _ = env_logger::try_init().ok();
    let backend = MockGateBackend::new();
    let gateway = StubGateway::default();
    let dispatcher = dispatcher(backend, gateway.clone(), test_config());

    dispatcher.handle_update(text_update(1000, "/add notanumber 123456")).await;
    dispatcher.handle_update(text_update(1000, "/revoke")).await;

    assert_eq!(gateway.sent_texts(), vec![replies::ADD_USAGE, replies::REVOKE_USAGE]);
}

#[tokio::test]
async fn unknown_text_gets_a_nudge() {
    let _ = env_logger::try_init().ok();
    let backend = MockGateBackend::new();
    let gateway = StubGateway::default();
    let dispatcher = dispatcher(backend, gateway.clone(), test_config());

    dispatcher.handle_update(text_update(55, "what is this")).await;

    assert_eq!(gateway.sent_texts(), vec![replies::UNKNOWN_COMMAND.to_string()]);
}
