use thiserror::Error;

use crate::db_types::{AccountId, LedgerRecord};

#[derive(Debug, Clone, Error)]
pub enum LedgerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for LedgerApiError {
    fn from(e: sqlx::Error) -> Self {
        LedgerApiError::DatabaseError(e.to_string())
    }
}

/// Read access to the deposit ledger. The ledger is keyed by broker account id; the secondary lookup goes through
/// the access table to find the ledger record a verified chat user is linked to.
///
/// The write path lives on [`super::SignalGateDatabase`]; the postback ingestion endpoint is the only component
/// that mutates the ledger.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Fetches the ledger record for the given account id. `None` means the account never came through our
    /// referral link; the `UNLINKED` verification outcome, which is a normal result and not an error.
    async fn fetch_ledger_record(&self, account_id: &AccountId) -> Result<Option<LedgerRecord>, LedgerApiError>;

    /// Fetches the ledger record linked to the given chat user via their access record, if any.
    async fn ledger_record_for_chat_user(&self, chat_user_id: i64) -> Result<Option<LedgerRecord>, LedgerApiError>;
}
