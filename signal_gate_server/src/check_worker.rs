use chrono::Utc;
use log::*;
use sg_common::UsdCents;
use signal_gate_engine::{
    db_types::{NewAccessRecord, VerificationCheck},
    traits::VerificationBackend,
    SqliteDatabase,
    VerificationApi,
    VerificationOutcome,
};
use telegram_tools::{MessageGateway, ReplyMarkup, SendMessage, TelegramApi};
use tokio::task::JoinHandle;

use crate::{dispatcher::DispatcherConfig, replies};

const CLAIM_BATCH: i64 = 20;

/// Starts the delayed verification check worker. Do not await the returned JoinHandle, as it will run
/// indefinitely.
///
/// Each claimed check re-runs the full verification state machine against current store state, so a deposit that
/// landed after the submission is counted, and a submission that was verified by other means in the meantime
/// short-circuits.
pub fn start_check_worker(
    db: SqliteDatabase,
    gateway: TelegramApi,
    threshold: UsdCents,
    config: DispatcherConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(1));
        let verifier = VerificationApi::new(db, threshold);
        info!("🕰️ Delayed verification check worker started");
        loop {
            timer.tick().await;
            let due = match verifier.claim_due_checks(Utc::now(), CLAIM_BATCH).await {
                Ok(due) => due,
                Err(e) => {
                    error!("🕰️ Could not claim due verification checks: {e}");
                    continue;
                },
            };
            if !due.is_empty() {
                debug!("🕰️ Running {} due verification checks", due.len());
            }
            // Each check runs as its own task. One slow outbound delivery must not hold up the rest of the
            // claimed batch, nor the next claim tick.
            for check in due {
                tokio::spawn(run_check(verifier.clone(), gateway.clone(), config.clone(), check));
            }
        }
    })
}

pub(crate) async fn run_check<B, G>(
    verifier: VerificationApi<B>,
    gateway: G,
    config: DispatcherConfig,
    check: VerificationCheck,
) where
    B: VerificationBackend,
    G: MessageGateway,
{
    // Submissions only come from private chats, where the chat id is the user id.
    let chat_id = check.chat_user_id;
    let submission = NewAccessRecord::new(check.chat_user_id, check.account_id.clone(), check.display_name.clone())
        .with_username(check.username.clone());
    let msg = match verifier.verify_submission(submission).await {
        Ok(outcome) => {
            let text = replies::outcome_text(&outcome, &check.display_name);
            let markup = match &outcome {
                VerificationOutcome::Verified(_) | VerificationOutcome::AlreadyVerified(_) => {
                    Some(ReplyMarkup::menu(&config.instruments, 3))
                },
                _ => replies::outcome_keyboard(&outcome, &check.account_id, &config.referral_link),
            };
            match markup {
                Some(markup) => SendMessage::new(chat_id, text).with_markup(markup),
                None => SendMessage::new(chat_id, text),
            }
        },
        Err(e) => {
            error!("🕰️ Verification check {} for chat user {} failed: {e}", check.id, check.chat_user_id);
            SendMessage::new(chat_id, replies::TRY_AGAIN)
        },
    };
    if let Err(e) = gateway.send_message(msg).await {
        warn!("🕰️ Could not deliver the check outcome to chat user {}: {e}", check.chat_user_id);
    }
}
