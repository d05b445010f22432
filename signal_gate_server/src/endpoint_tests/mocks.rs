use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
    Mutex,
};

use chrono::{DateTime, Utc};
use mockall::mock;
use signal_gate_engine::{
    db_types::{
        AccessRecord,
        AccountId,
        DepositEvent,
        LedgerRecord,
        NewAccessRecord,
        NewVerificationCheck,
        PostbackOutcome,
        VerificationCheck,
    },
    traits::{
        AccessApiError,
        AccessManagement,
        LedgerApiError,
        LedgerManagement,
        SignalGateDatabase,
        SignalGateError,
        VerificationBackend,
    },
};
use telegram_tools::{EditMessageText, MessageGateway, MessageHandle, SendMessage, TelegramApiError};

mock! {
    pub GateBackend {}
    impl LedgerManagement for GateBackend {
        async fn fetch_ledger_record(&self, account_id: &AccountId) -> Result<Option<LedgerRecord>, LedgerApiError>;
        async fn ledger_record_for_chat_user(&self, chat_user_id: i64) -> Result<Option<LedgerRecord>, LedgerApiError>;
    }
    impl AccessManagement for GateBackend {
        async fn fetch_access_record(&self, chat_user_id: i64) -> Result<Option<AccessRecord>, AccessApiError>;
        async fn fetch_access_record_for_account(&self, account_id: &AccountId) -> Result<Option<AccessRecord>, AccessApiError>;
        async fn upsert_access_record(&self, record: NewAccessRecord) -> Result<AccessRecord, AccessApiError>;
        async fn revoke_access(&self, chat_user_id: i64) -> Result<bool, AccessApiError>;
    }
    impl SignalGateDatabase for GateBackend {
        fn url(&self) -> &str;
        async fn process_deposit_event(&self, event: DepositEvent) -> Result<PostbackOutcome, SignalGateError>;
        async fn enqueue_verification(&self, check: NewVerificationCheck) -> Result<i64, SignalGateError>;
        async fn claim_due_checks(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<VerificationCheck>, SignalGateError>;
    }
}

impl VerificationBackend for MockGateBackend {}

pub fn access_record(chat_user_id: i64, account_id: &str) -> AccessRecord {
    AccessRecord {
        chat_user_id,
        account_id: account_id.into(),
        display_name: "Alice".into(),
        username: Some("alice".into()),
        verified_at: Utc::now(),
    }
}

/// Records every outbound call and hands out sequential message ids. Cloning shares the recording, so the copy
/// held by the dispatcher and the copy held by the test see the same traffic.
#[derive(Clone, Default)]
pub struct StubGateway {
    sent: Arc<Mutex<Vec<SendMessage>>>,
    edits: Arc<Mutex<Vec<EditMessageText>>>,
    answered: Arc<Mutex<Vec<String>>>,
    next_id: Arc<AtomicI64>,
}

impl StubGateway {
    pub fn sent(&self) -> Vec<SendMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
    }

    pub fn edit_texts(&self) -> Vec<String> {
        self.edits.lock().unwrap().iter().map(|e| e.text.clone()).collect()
    }

    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().unwrap().clone()
    }
}

impl MessageGateway for StubGateway {
    async fn send_message(&self, msg: SendMessage) -> Result<MessageHandle, TelegramApiError> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let chat_id = msg.chat_id;
        self.sent.lock().unwrap().push(msg);
        Ok(MessageHandle { chat_id, message_id })
    }

    async fn edit_message(&self, edit: EditMessageText) -> Result<(), TelegramApiError> {
        self.edits.lock().unwrap().push(edit);
        Ok(())
    }

    async fn delete_message(&self, _handle: &MessageHandle) -> Result<(), TelegramApiError> {
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TelegramApiError> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }
}
