use thiserror::Error;

use crate::db_types::{AccessRecord, AccountId, NewAccessRecord};

#[derive(Debug, Clone, Error)]
pub enum AccessApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Account {account_id} is already claimed by chat user {claimed_by}")]
    AccountAlreadyClaimed { account_id: AccountId, claimed_by: i64 },
}

impl From<sqlx::Error> for AccessApiError {
    fn from(e: sqlx::Error) -> Self {
        AccessApiError::DatabaseError(e.to_string())
    }
}

/// The Access Store: durable per-user authorization records. Exclusively mutated by the verification engine (and
/// the admin grant/revoke commands, which go through the same methods); gated command handlers only ever read it.
#[allow(async_fn_in_trait)]
pub trait AccessManagement {
    async fn fetch_access_record(&self, chat_user_id: i64) -> Result<Option<AccessRecord>, AccessApiError>;

    /// Looks up the access record claiming the given broker account id, whoever holds it.
    async fn fetch_access_record_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<AccessRecord>, AccessApiError>;

    /// Writes an authorization record. If the chat user already holds a record, only the display metadata (and
    /// account id) are refreshed; `verified_at` keeps its original value. Claiming an account id that is already
    /// held by a *different* chat user fails with [`AccessApiError::AccountAlreadyClaimed`].
    async fn upsert_access_record(&self, record: NewAccessRecord) -> Result<AccessRecord, AccessApiError>;

    /// Deletes the record for the given chat user. Returns `true` if a record existed. Only the admin revoke
    /// command calls this.
    async fn revoke_access(&self, chat_user_id: i64) -> Result<bool, AccessApiError>;
}
