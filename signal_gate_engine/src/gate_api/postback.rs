use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{DepositEvent, PostbackOutcome},
    traits::{SignalGateDatabase, SignalGateError},
};

/// Ingestion API for the affiliate network's postback events. This is the only component that mutates the ledger.
pub struct PostbackApi<B> {
    db: B,
}

impl<B: Debug> Debug for PostbackApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PostbackApi ({:?})", self.db)
    }
}

impl<B> PostbackApi<B>
where B: SignalGateDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Applies one event to the ledger. Delivery is at-least-once and unordered; see
    /// [`SignalGateDatabase::process_deposit_event`] for the exact semantics.
    pub async fn process_event(&self, event: DepositEvent) -> Result<PostbackOutcome, SignalGateError> {
        trace!("📬️ Processing {} event for {}", event.kind, event.account_id);
        self.db.process_deposit_event(event).await
    }
}
