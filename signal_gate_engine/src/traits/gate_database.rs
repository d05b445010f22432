use chrono::{DateTime, Utc};
use sg_common::UsdCents;
use thiserror::Error;

use crate::db_types::{DepositEvent, NewVerificationCheck, PostbackOutcome, VerificationCheck};

#[derive(Debug, Clone, Error)]
pub enum SignalGateError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),
    #[error("Negative deposit amount: {0}")]
    NegativeAmount(UsdCents),
}

impl From<sqlx::Error> for SignalGateError {
    fn from(e: sqlx::Error) -> Self {
        SignalGateError::DatabaseError(e.to_string())
    }
}

/// The write path of the gate: postback ingestion into the ledger, and the durable delayed-check queue.
#[allow(async_fn_in_trait)]
pub trait SignalGateDatabase {
    /// The URL for the database.
    fn url(&self) -> &str;

    /// Applies one postback event to the ledger in a single atomic operation.
    ///
    /// * If no record exists for the account id, one is created (`total_deposit` starts at the event amount, which
    ///   is zero for a pure registration event). A `redeposit` arriving before its `registration` is fine; events
    ///   are unordered.
    /// * If a record exists, the amount is accumulated with a storage-native atomic increment. Two concurrent
    ///   postbacks for the same account id must both land; lost updates are a bug, not a tolerated race.
    /// * If the event carries a dedup key that has been seen before, nothing is changed and the current record is
    ///   returned with [`PostbackStatus::Duplicate`](crate::db_types::PostbackStatus).
    async fn process_deposit_event(&self, event: DepositEvent) -> Result<PostbackOutcome, SignalGateError>;

    /// Queues a delayed verification check. Returns the queue row id.
    async fn enqueue_verification(&self, check: NewVerificationCheck) -> Result<i64, SignalGateError>;

    /// Atomically claims (and removes) up to `limit` checks whose `scheduled_at` is due. Each queued check is
    /// returned to exactly one caller, ever; the delayed check is one-shot and does not poll.
    async fn claim_due_checks(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<VerificationCheck>, SignalGateError>;
}
