use sg_common::UsdCents;
use signal_gate_engine::VerificationApi;
use telegram_tools::{CallbackQuery, Chat, Message, Update, User};

use super::mocks::{MockGateBackend, StubGateway};
use crate::dispatcher::{DispatcherConfig, UpdateDispatcher};

pub fn test_config() -> DispatcherConfig {
    DispatcherConfig {
        instruments: vec!["EUR/USD".into(), "BTC/USD".into()],
        referral_link: "https://example.com/ref".into(),
        support_link: "https://example.com/help".into(),
        admin_ids: vec![1000],
        check_delay_secs: 0,
    }
}

pub fn dispatcher(
    backend: MockGateBackend,
    gateway: StubGateway,
    config: DispatcherConfig,
) -> UpdateDispatcher<MockGateBackend, StubGateway> {
    UpdateDispatcher::new(VerificationApi::new(backend, UsdCents::from_dollars(20)), gateway, config)
}

pub fn chat_user(id: i64) -> User {
    User { id, username: Some("alice".into()), first_name: Some("Alice".into()), last_name: None }
}

pub fn text_update(user_id: i64, text: &str) -> Update {
    Update {
        update_id: 1,
        message: Some(Message {
            message_id: 7,
            chat: Chat { id: user_id },
            from: Some(chat_user(user_id)),
            text: text.into(),
        }),
        callback_query: None,
    }
}

pub fn callback_update(user_id: i64, data: &str) -> Update {
    Update {
        update_id: 2,
        message: None,
        callback_query: Some(CallbackQuery {
            id: "cb-1".into(),
            from: Some(chat_user(user_id)),
            data: data.into(),
            message: Some(Message {
                message_id: 8,
                chat: Chat { id: user_id },
                from: None,
                text: String::new(),
            }),
        }),
    }
}
