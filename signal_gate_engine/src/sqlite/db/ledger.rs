use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AccountId, DepositEvent, EventKind, LedgerRecord},
    traits::{LedgerApiError, SignalGateError},
};

/// Result of recording a dedup key for a postback event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertEventResult {
    Inserted,
    AlreadyExists,
}

/// Records the sender's per-event dedup key. A unique violation means this delivery is a retry of an event that
/// has already been applied.
pub async fn idempotent_insert_event(
    event_id: &str,
    account_id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<InsertEventResult, SignalGateError> {
    let result = sqlx::query("INSERT INTO postback_events (event_id, account_id) VALUES ($1, $2)")
        .bind(event_id)
        .bind(account_id)
        .execute(conn)
        .await;
    match result {
        Ok(_) => Ok(InsertEventResult::Inserted),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertEventResult::AlreadyExists),
        Err(e) => Err(SignalGateError::from(e)),
    }
}

/// Applies one deposit event to the ledger as a single atomic statement. The accumulation happens inside the
/// database (`total_deposit = total_deposit + delta`), so concurrent postbacks for the same account id serialize
/// at the storage layer and no update can be lost to a read-modify-write race.
pub async fn upsert_deposit(
    event: &DepositEvent,
    conn: &mut SqliteConnection,
) -> Result<LedgerRecord, SignalGateError> {
    let amount = event.amount.value();
    let registered = event.kind == EventKind::Registration;
    let record = sqlx::query_as::<_, LedgerRecord>(
        r#"
        INSERT INTO ledger_accounts (account_id, total_deposit, registered, last_event_amount, last_event_kind)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (account_id) DO UPDATE SET
            total_deposit = ledger_accounts.total_deposit + excluded.total_deposit,
            registered = ledger_accounts.registered OR excluded.registered,
            last_event_amount = excluded.last_event_amount,
            last_event_kind = excluded.last_event_kind,
            updated_at = CURRENT_TIMESTAMP
        RETURNING account_id, total_deposit, registered, last_event_amount, last_event_kind, created_at, updated_at
        "#,
    )
    .bind(&event.account_id)
    .bind(amount)
    .bind(registered)
    .bind(amount)
    .bind(event.kind)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Ledger record for {} now totals {}", record.account_id, record.total_deposit);
    Ok(record)
}

pub async fn fetch_ledger_record(
    account_id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerRecord>, LedgerApiError> {
    let record = sqlx::query_as::<_, LedgerRecord>(
        r#"
        SELECT account_id, total_deposit, registered, last_event_amount, last_event_kind, created_at, updated_at
        FROM ledger_accounts WHERE account_id = $1
        "#,
    )
    .bind(account_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// Secondary-key lookup: the ledger record linked to a chat user through their access record.
pub async fn ledger_record_for_chat_user(
    chat_user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerRecord>, LedgerApiError> {
    let record = sqlx::query_as::<_, LedgerRecord>(
        r#"
        SELECT l.account_id, l.total_deposit, l.registered, l.last_event_amount, l.last_event_kind,
               l.created_at, l.updated_at
        FROM ledger_accounts l
        INNER JOIN access_records a ON a.account_id = l.account_id
        WHERE a.chat_user_id = $1
        "#,
    )
    .bind(chat_user_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

pub async fn record_exists(account_id: &AccountId, conn: &mut SqliteConnection) -> Result<bool, SignalGateError> {
    let row = sqlx::query("SELECT 1 FROM ledger_accounts WHERE account_id = $1 LIMIT 1")
        .bind(account_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}
