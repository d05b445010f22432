//! `SqliteDatabase` is a concrete implementation of a signal-gate backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sg_common::UsdCents;
use sqlx::SqlitePool;

use super::db::{access, checks, ledger, new_pool};
use crate::{
    db_types::{
        AccessRecord,
        AccountId,
        DepositEvent,
        LedgerRecord,
        NewAccessRecord,
        NewVerificationCheck,
        PostbackOutcome,
        PostbackStatus,
        VerificationCheck,
    },
    sqlite::db::ledger::InsertEventResult,
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

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool for the given URL.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SignalGateError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Run once at startup, before serving requests.
    pub async fn migrate(&self) -> Result<(), SignalGateError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SignalGateError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

impl SignalGateDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Takes a postback event, and in a single atomic transaction,
    /// * records the sender's dedup key, if one was provided. A key that has been seen before short-circuits with
    ///   `Duplicate` and leaves the ledger untouched.
    /// * upserts the ledger record. The accumulation is a storage-native increment, so concurrent deliveries for
    ///   the same account id cannot lose updates.
    async fn process_deposit_event(&self, event: DepositEvent) -> Result<PostbackOutcome, SignalGateError> {
        if event.account_id.as_str().trim().is_empty() {
            return Err(SignalGateError::InvalidAccountId("missing account_id".to_string()));
        }
        // Deposits only add. A negative amount would walk the total backwards, so it never reaches the ledger.
        if event.amount < UsdCents::default() {
            return Err(SignalGateError::NegativeAmount(event.amount));
        }
        let mut tx = self.pool.begin().await?;
        if let Some(event_id) = &event.event_id {
            let inserted = ledger::idempotent_insert_event(event_id, &event.account_id, &mut tx).await?;
            if inserted == InsertEventResult::AlreadyExists {
                if let Some(record) = ledger::fetch_ledger_record(&event.account_id, &mut tx)
                    .await
                    .map_err(|e| SignalGateError::DatabaseError(e.to_string()))?
                {
                    debug!("🗃️ Postback event {event_id} already applied to {}. Skipping", event.account_id);
                    tx.commit().await?;
                    return Ok(PostbackOutcome { status: PostbackStatus::Duplicate, record });
                }
                // A dedup key without a matching ledger record means the first delivery never landed. Fall
                // through and apply the event after all.
                warn!("🗃️ Dedup key {event_id} was known but {} has no ledger record", event.account_id);
            }
        }
        let existed = ledger::record_exists(&event.account_id, &mut tx).await?;
        let record = ledger::upsert_deposit(&event, &mut tx).await?;
        tx.commit().await?;
        let status = if existed { PostbackStatus::Updated } else { PostbackStatus::Registered };
        debug!(
            "🗃️ {} event for {}: {status}, total now {}",
            event.kind, record.account_id, record.total_deposit
        );
        Ok(PostbackOutcome { status, record })
    }

    async fn enqueue_verification(&self, check: NewVerificationCheck) -> Result<i64, SignalGateError> {
        let mut conn = self.pool.acquire().await?;
        let id = checks::enqueue(check, &mut conn).await?;
        trace!("🗃️ Queued verification check #{id}");
        Ok(id)
    }

    async fn claim_due_checks(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<VerificationCheck>, SignalGateError> {
        let mut conn = self.pool.acquire().await?;
        checks::claim_due(now, limit, &mut conn).await
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_ledger_record(&self, account_id: &AccountId) -> Result<Option<LedgerRecord>, LedgerApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| LedgerApiError::DatabaseError(e.to_string()))?;
        ledger::fetch_ledger_record(account_id, &mut conn).await
    }

    async fn ledger_record_for_chat_user(&self, chat_user_id: i64) -> Result<Option<LedgerRecord>, LedgerApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| LedgerApiError::DatabaseError(e.to_string()))?;
        ledger::ledger_record_for_chat_user(chat_user_id, &mut conn).await
    }
}

impl AccessManagement for SqliteDatabase {
    async fn fetch_access_record(&self, chat_user_id: i64) -> Result<Option<AccessRecord>, AccessApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AccessApiError::DatabaseError(e.to_string()))?;
        access::fetch_access_record(chat_user_id, &mut conn).await
    }

    async fn fetch_access_record_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<AccessRecord>, AccessApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AccessApiError::DatabaseError(e.to_string()))?;
        access::fetch_access_record_for_account(account_id, &mut conn).await
    }

    async fn upsert_access_record(&self, record: NewAccessRecord) -> Result<AccessRecord, AccessApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AccessApiError::DatabaseError(e.to_string()))?;
        access::upsert_access_record(record, &mut conn).await
    }

    async fn revoke_access(&self, chat_user_id: i64) -> Result<bool, AccessApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AccessApiError::DatabaseError(e.to_string()))?;
        access::revoke_access(chat_user_id, &mut conn).await
    }
}

impl VerificationBackend for SqliteDatabase {}
