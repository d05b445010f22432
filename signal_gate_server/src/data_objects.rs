use serde::{Deserialize, Serialize};
use sg_common::{Secret, UsdCents};
use signal_gate_engine::db_types::{PostbackOutcome, PostbackStatus};

/// The optional shared-token guard on the postback endpoint. With no token configured, everything is accepted.
#[derive(Clone, Debug, Default)]
pub struct PostbackAuth {
    pub token: Option<Secret>,
}

impl PostbackAuth {
    pub fn new(token: Option<Secret>) -> Self {
        Self { token }
    }

    pub fn accepts(&self, presented: Option<&str>) -> bool {
        match &self.token {
            Some(expected) => presented == Some(expected.reveal()),
            None => true,
        }
    }
}

/// The query string of an affiliate postback. Everything is optional at the type level; the handler decides what
/// is fatal and answers 200 either way, because a non-2xx makes the network retry and a retry of a bad request is
/// still a bad request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostbackQuery {
    pub account_id: Option<String>,
    pub amount: Option<String>,
    pub event_kind: Option<String>,
    pub event_id: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PostbackResponse {
    Registered { account_id: String, total_deposit: UsdCents },
    Updated { account_id: String, total_deposit: UsdCents },
    Duplicate { account_id: String, total_deposit: UsdCents },
    Error { message: String },
}

impl PostbackResponse {
    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::Error { message: message.into() }
    }
}

impl From<PostbackOutcome> for PostbackResponse {
    fn from(outcome: PostbackOutcome) -> Self {
        let account_id = outcome.record.account_id.to_string();
        let total_deposit = outcome.record.total_deposit;
        match outcome.status {
            PostbackStatus::Registered => Self::Registered { account_id, total_deposit },
            PostbackStatus::Updated => Self::Updated { account_id, total_deposit },
            PostbackStatus::Duplicate => Self::Duplicate { account_id, total_deposit },
        }
    }
}
