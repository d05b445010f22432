use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewVerificationCheck, VerificationCheck},
    traits::SignalGateError,
};

pub async fn enqueue(check: NewVerificationCheck, conn: &mut SqliteConnection) -> Result<i64, SignalGateError> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO verification_checks (chat_user_id, account_id, display_name, username, scheduled_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(check.chat_user_id)
    .bind(&check.account_id)
    .bind(&check.display_name)
    .bind(&check.username)
    .bind(check.scheduled_at)
    .fetch_one(conn)
    .await?;
    Ok(row.0)
}

/// Claims due checks by deleting them in the same statement. The DELETE is atomic, so even with several workers a
/// queued check is handed to exactly one of them.
pub async fn claim_due(
    now: DateTime<Utc>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<VerificationCheck>, SignalGateError> {
    let claimed = sqlx::query_as::<_, VerificationCheck>(
        r#"
        DELETE FROM verification_checks
        WHERE id IN (
            SELECT id FROM verification_checks WHERE scheduled_at <= $1 ORDER BY scheduled_at LIMIT $2
        )
        RETURNING id, chat_user_id, account_id, display_name, username, scheduled_at, created_at
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(claimed)
}
