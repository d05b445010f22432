use std::time::Duration;

use chrono::Utc;
use mockall::predicate::eq;
use sg_common::UsdCents;
use signal_gate_engine::{
    db_types::{EventKind, LedgerRecord, VerificationCheck},
    VerificationApi,
};
use telegram_tools::{EditMessageText, MessageGateway, MessageHandle, SendMessage, TelegramApiError};

use super::{
    helpers::test_config,
    mocks::{access_record, MockGateBackend, StubGateway},
};
use crate::check_worker::run_check;

fn due_check(id: i64, chat_user_id: i64, account_id: &str) -> VerificationCheck {
    VerificationCheck {
        id,
        chat_user_id,
        account_id: account_id.into(),
        display_name: "Alice".into(),
        username: Some("alice".into()),
        scheduled_at: Utc::now(),
        created_at: Utc::now(),
    }
}

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

fn below_threshold_backend() -> MockGateBackend {
    let mut backend = MockGateBackend::new();
    backend.expect_fetch_access_record().returning(|_| Ok(None));
    backend.expect_fetch_access_record_for_account().returning(|_| Ok(None));
    backend
        .expect_fetch_ledger_record()
        .returning(|id| Ok(Some(ledger_record(id.as_str(), UsdCents::from_dollars(5)))));
    backend
}

#[tokio::test]
async fn claimed_checks_reread_current_ledger_state() {
    let _ = env_logger::try_init().ok();
    // The deposit landed while the check sat in the queue, so the claimed check must see the new total.
    let mut backend = MockGateBackend::new();
    backend.expect_fetch_access_record().with(eq(42)).returning(|_| Ok(None));
    backend.expect_fetch_access_record_for_account().returning(|_| Ok(None));
    backend
        .expect_fetch_ledger_record()
        .returning(|id| Ok(Some(ledger_record(id.as_str(), UsdCents::from_dollars(25)))));
    backend
        .expect_upsert_access_record()
        .withf(|r| r.chat_user_id == 42 && r.account_id.as_str() == "555111")
        .returning(|r| Ok(access_record(r.chat_user_id, r.account_id.as_str())));

    let gateway = StubGateway::default();
    let verifier = VerificationApi::new(backend, UsdCents::from_dollars(20));
    run_check(verifier, gateway.clone(), test_config(), due_check(1, 42, "555111")).await;

    let sent = gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, 42);
    assert!(sent[0].reply_markup.is_some(), "a verified outcome offers the instrument menu");
}

/// Delegates to a [`StubGateway`] but stalls deliveries to one chat.
#[derive(Clone)]
struct SlowChatGateway {
    inner: StubGateway,
    slow_chat: i64,
    delay: Duration,
}

impl MessageGateway for SlowChatGateway {
    async fn send_message(&self, msg: SendMessage) -> Result<MessageHandle, TelegramApiError> {
        if msg.chat_id == self.slow_chat {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.send_message(msg).await
    }

    async fn edit_message(&self, edit: EditMessageText) -> Result<(), TelegramApiError> {
        self.inner.edit_message(edit).await
    }

    async fn delete_message(&self, handle: &MessageHandle) -> Result<(), TelegramApiError> {
        self.inner.delete_message(handle).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TelegramApiError> {
        self.inner.answer_callback(callback_id).await
    }
}

#[tokio::test(start_paused = true)]
async fn a_slow_delivery_does_not_hold_up_the_batch() {
    let _ = env_logger::try_init().ok();
    let gateway = SlowChatGateway {
        inner: StubGateway::default(),
        slow_chat: 1,
        delay: Duration::from_secs(10),
    };
    let threshold = UsdCents::from_dollars(20);
    let slow = tokio::spawn(run_check(
        VerificationApi::new(below_threshold_backend(), threshold),
        gateway.clone(),
        test_config(),
        due_check(1, 1, "100100"),
    ));
    let fast = tokio::spawn(run_check(
        VerificationApi::new(below_threshold_backend(), threshold),
        gateway.clone(),
        test_config(),
        due_check(2, 2, "100200"),
    ));

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    let chats: Vec<i64> = gateway.inner.sent().iter().map(|m| m.chat_id).collect();
    assert_eq!(chats, vec![2], "the fast delivery must not wait for the slow one");

    slow.await.unwrap();
    fast.await.unwrap();
    let chats: Vec<i64> = gateway.inner.sent().iter().map(|m| m.chat_id).collect();
    assert_eq!(chats, vec![2, 1]);
}
