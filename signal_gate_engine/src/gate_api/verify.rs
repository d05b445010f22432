use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sg_common::UsdCents;
use thiserror::Error;

use crate::{
    db_types::{AccessRecord, AccountId, LedgerRecord, NewAccessRecord, NewVerificationCheck, VerificationCheck},
    traits::{AccessApiError, LedgerApiError, SignalGateError, VerificationBackend},
};

#[derive(Debug, Clone, Error)]
pub enum VerificationError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerApiError),
    #[error("Access store error: {0}")]
    Access(#[from] AccessApiError),
    #[error("Backend error: {0}")]
    Backend(#[from] SignalGateError),
}

/// The decision the state machine reached for one submission. Every submission is re-evaluated from scratch
/// against current store state; nothing intermediate is persisted.
#[derive(Debug, Clone)]
pub enum VerificationOutcome {
    /// The user already holds an access record. Decided from the access store alone; no ledger read happens.
    AlreadyVerified(AccessRecord),
    /// The threshold was met and an access record has been written.
    Verified(AccessRecord),
    /// The account is in the ledger but its total has not reached the threshold yet. Retryable.
    BelowThreshold { total: UsdCents, threshold: UsdCents },
    /// The account id has no ledger record, i.e. not registered through our referral link.
    Unlinked,
    /// A different chat user already claimed this account id.
    AlreadyClaimed { claimed_by: i64 },
}

/// Drives the per-user verification state machine and owns all writes to the access store.
pub struct VerificationApi<B> {
    db: B,
    threshold: UsdCents,
}

impl<B: Debug> Debug for VerificationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerificationApi (threshold {}, {:?})", self.threshold, self.db)
    }
}

impl<B: Clone> Clone for VerificationApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), threshold: self.threshold }
    }
}

impl<B> VerificationApi<B>
where B: VerificationBackend
{
    pub fn new(db: B, threshold: UsdCents) -> Self {
        Self { db, threshold }
    }

    pub fn threshold(&self) -> UsdCents {
        self.threshold
    }

    /// Evaluates one submitted account id for one chat user.
    ///
    /// The ordering is deliberate: the access-store check happens before any ledger lookup, so an
    /// already-verified user short-circuits without touching the ledger at all.
    pub async fn verify_submission(
        &self,
        submission: NewAccessRecord,
    ) -> Result<VerificationOutcome, VerificationError> {
        let chat_user_id = submission.chat_user_id;
        if let Some(existing) = self.db.fetch_access_record(chat_user_id).await? {
            trace!("🚦️ Chat user {chat_user_id} is already verified. Short-circuiting");
            return Ok(VerificationOutcome::AlreadyVerified(existing));
        }
        if let Some(holder) = self.db.fetch_access_record_for_account(&submission.account_id).await? {
            if holder.chat_user_id != chat_user_id {
                debug!(
                    "🚦️ Account {} submitted by {chat_user_id} is already claimed by {}",
                    submission.account_id, holder.chat_user_id
                );
                return Ok(VerificationOutcome::AlreadyClaimed { claimed_by: holder.chat_user_id });
            }
        }
        let record = match self.db.fetch_ledger_record(&submission.account_id).await? {
            Some(r) => r,
            None => {
                debug!("🚦️ No ledger record for {}. Submission by {chat_user_id} is unlinked", submission.account_id);
                return Ok(VerificationOutcome::Unlinked);
            },
        };
        if record.total_deposit < self.threshold {
            debug!(
                "🚦️ Account {} totals {} of the {} required",
                submission.account_id, record.total_deposit, self.threshold
            );
            return Ok(VerificationOutcome::BelowThreshold { total: record.total_deposit, threshold: self.threshold });
        }
        // The threshold is met (equality counts). Persist the decision. A concurrent claim of the same account id
        // can still beat us to the unique index, which surfaces as AlreadyClaimed rather than an error.
        match self.db.upsert_access_record(submission).await {
            Ok(saved) => {
                info!("🚦️ Chat user {chat_user_id} verified for account {}", saved.account_id);
                Ok(VerificationOutcome::Verified(saved))
            },
            Err(AccessApiError::AccountAlreadyClaimed { claimed_by, account_id }) => {
                debug!("🚦️ Lost the claim race for {account_id} to {claimed_by}");
                Ok(VerificationOutcome::AlreadyClaimed { claimed_by })
            },
            Err(e) => Err(e.into()),
        }
    }

    /// True if the chat user holds an access record. The gate every restricted command goes through.
    pub async fn is_verified(&self, chat_user_id: i64) -> Result<bool, VerificationError> {
        Ok(self.db.fetch_access_record(chat_user_id).await?.is_some())
    }

    /// The ledger record a verified user is linked to, for the deposit-total view.
    pub async fn recorded_ledger_for_user(
        &self,
        chat_user_id: i64,
    ) -> Result<Option<LedgerRecord>, VerificationError> {
        Ok(self.db.ledger_record_for_chat_user(chat_user_id).await?)
    }

    /// Queues a delayed check to run at `scheduled_at`. One evaluation happens when the check is claimed; the
    /// worker re-reads store state at that moment, so overlapping submissions cannot act on stale values.
    pub async fn schedule_check(
        &self,
        submission: NewAccessRecord,
        scheduled_at: DateTime<Utc>,
    ) -> Result<i64, VerificationError> {
        let check = NewVerificationCheck::new(submission, scheduled_at);
        Ok(self.db.enqueue_verification(check).await?)
    }

    /// Claims the delayed checks that are due as of `now`. Each check is returned exactly once, ever.
    pub async fn claim_due_checks(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<VerificationCheck>, VerificationError> {
        Ok(self.db.claim_due_checks(now, limit).await?)
    }

    /// Admin grant: writes an access record directly, bypassing the threshold policy but not the
    /// one-claim-per-account rule.
    pub async fn grant_access(&self, record: NewAccessRecord) -> Result<AccessRecord, VerificationError> {
        let saved = self.db.upsert_access_record(record).await?;
        info!("🚦️ Access granted to chat user {} by admin", saved.chat_user_id);
        Ok(saved)
    }

    /// Admin revoke: deletes the access record. Returns `true` if one existed.
    pub async fn revoke_access(&self, chat_user_id: i64) -> Result<bool, VerificationError> {
        let removed = self.db.revoke_access(chat_user_id).await?;
        if removed {
            info!("🚦️ Access revoked for chat user {chat_user_id}");
        }
        Ok(removed)
    }
}
