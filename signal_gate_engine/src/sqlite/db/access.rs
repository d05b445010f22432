use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AccessRecord, AccountId, NewAccessRecord},
    traits::AccessApiError,
};

pub async fn fetch_access_record(
    chat_user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<AccessRecord>, AccessApiError> {
    let record = sqlx::query_as::<_, AccessRecord>(
        r#"
        SELECT chat_user_id, account_id, display_name, username, verified_at
        FROM access_records WHERE chat_user_id = $1
        "#,
    )
    .bind(chat_user_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_access_record_for_account(
    account_id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<Option<AccessRecord>, AccessApiError> {
    let record = sqlx::query_as::<_, AccessRecord>(
        r#"
        SELECT chat_user_id, account_id, display_name, username, verified_at
        FROM access_records WHERE account_id = $1
        "#,
    )
    .bind(account_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// Writes an authorization record. An existing record for the same chat user only has its metadata refreshed;
/// `verified_at` is set once, on first authorization. The UNIQUE constraint on `account_id` turns a claim of
/// somebody else's account into [`AccessApiError::AccountAlreadyClaimed`]; first claim wins.
pub async fn upsert_access_record(
    record: NewAccessRecord,
    conn: &mut SqliteConnection,
) -> Result<AccessRecord, AccessApiError> {
    let result = sqlx::query_as::<_, AccessRecord>(
        r#"
        INSERT INTO access_records (chat_user_id, account_id, display_name, username)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (chat_user_id) DO UPDATE SET
            account_id = excluded.account_id,
            display_name = excluded.display_name,
            username = excluded.username
        RETURNING chat_user_id, account_id, display_name, username, verified_at
        "#,
    )
    .bind(record.chat_user_id)
    .bind(&record.account_id)
    .bind(&record.display_name)
    .bind(&record.username)
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(saved) => {
            debug!("🧑️ Authorized chat user {} for account {}", saved.chat_user_id, saved.account_id);
            Ok(saved)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let claimed_by = fetch_access_record_for_account(&record.account_id, conn)
                .await?
                .map(|r| r.chat_user_id)
                .unwrap_or_default();
            Err(AccessApiError::AccountAlreadyClaimed { account_id: record.account_id, claimed_by })
        },
        Err(e) => Err(AccessApiError::from(e)),
    }
}

pub async fn revoke_access(chat_user_id: i64, conn: &mut SqliteConnection) -> Result<bool, AccessApiError> {
    let result = sqlx::query("DELETE FROM access_records WHERE chat_user_id = $1")
        .bind(chat_user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
