use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sg_common::UsdCents;
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     AccountId       ---------------------------------------------------------
/// A broker account id, as reported by the affiliate network and as submitted by chat users. A lightweight wrapper
/// around a string; validation of user-submitted ids happens at the dispatch layer.
#[derive(Clone, Debug, Type, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct AccountId(pub String);

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for AccountId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl AccountId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

//--------------------------------------     EventKind       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Registration,
    FirstDeposit,
    Redeposit,
}

#[derive(Debug, Clone, Error)]
#[error("Unknown postback event kind: {0}")]
pub struct UnknownEventKind(String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    /// Affiliate networks are not consistent about event names; accept the spellings seen in the wild.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registration" | "reg" => Ok(Self::Registration),
            "deposit" | "ftd" | "first_deposit" => Ok(Self::FirstDeposit),
            "redeposit" | "dep" => Ok(Self::Redeposit),
            other => Err(UnknownEventKind(other.to_string())),
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Registration => "registration",
            Self::FirstDeposit => "first_deposit",
            Self::Redeposit => "redeposit",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------    LedgerRecord     ---------------------------------------------------------
/// One row of the deposit ledger. `total_deposit` only ever grows; the ledger is append-only financial history and
/// records are never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub account_id: AccountId,
    pub total_deposit: UsdCents,
    pub registered: bool,
    pub last_event_amount: UsdCents,
    pub last_event_kind: EventKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    DepositEvent     ---------------------------------------------------------
/// A single postback notification from the affiliate network. `event_id` is the sender's per-event dedup key; when
/// present, redelivery of the same logical event is a no-op. Without it, the at-least-once delivery contract means
/// a retried delivery double-counts; that risk sits with the sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    pub account_id: AccountId,
    pub amount: UsdCents,
    pub kind: EventKind,
    pub event_id: Option<String>,
}

impl DepositEvent {
    pub fn new<A: Into<AccountId>>(account_id: A, amount: UsdCents, kind: EventKind) -> Self {
        Self { account_id: account_id.into(), amount, kind, event_id: None }
    }

    pub fn with_event_id<S: Into<String>>(mut self, event_id: S) -> Self {
        self.event_id = Some(event_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostbackStatus {
    /// First event for this account id; a ledger record was created.
    Registered,
    /// The existing record was accumulated into.
    Updated,
    /// The dedup key had been seen before; nothing was changed.
    Duplicate,
}

impl Display for PostbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Registered => "registered",
            Self::Updated => "updated",
            Self::Duplicate => "duplicate",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostbackOutcome {
    pub status: PostbackStatus,
    pub record: LedgerRecord,
}

//--------------------------------------    AccessRecord     ---------------------------------------------------------
/// A durable authorization decision for one chat user. At most one record per `chat_user_id`, and each broker
/// account id can back at most one record (first claim wins).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AccessRecord {
    pub chat_user_id: i64,
    pub account_id: AccountId,
    pub display_name: String,
    pub username: Option<String>,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccessRecord {
    pub chat_user_id: i64,
    pub account_id: AccountId,
    pub display_name: String,
    pub username: Option<String>,
}

impl NewAccessRecord {
    pub fn new<A: Into<AccountId>, S: Into<String>>(chat_user_id: i64, account_id: A, display_name: S) -> Self {
        Self { chat_user_id, account_id: account_id.into(), display_name: display_name.into(), username: None }
    }

    pub fn with_username<S: Into<String>>(mut self, username: Option<S>) -> Self {
        self.username = username.map(Into::into);
        self
    }
}

//--------------------------------------  VerificationCheck  ---------------------------------------------------------
/// A queued delayed verification check. These are one-shot: claiming a due check removes it, and the worker
/// re-reads current ledger and access state when it runs, so a stale queue entry can never cause a stale write.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCheck {
    pub id: i64,
    pub chat_user_id: i64,
    pub account_id: AccountId,
    pub display_name: String,
    pub username: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVerificationCheck {
    pub chat_user_id: i64,
    pub account_id: AccountId,
    pub display_name: String,
    pub username: Option<String>,
    pub scheduled_at: DateTime<Utc>,
}

impl NewVerificationCheck {
    pub fn new(record: NewAccessRecord, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            chat_user_id: record.chat_user_id,
            account_id: record.account_id,
            display_name: record.display_name,
            username: record.username,
            scheduled_at,
        }
    }
}
