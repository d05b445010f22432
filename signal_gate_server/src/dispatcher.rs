//! Routes inbound Telegram updates to their handlers.
//!
//! The webhook endpoint acks before any of this runs, so everything here happens on a detached task and failures
//! are reported to the chat user (or just logged), never to the HTTP response. Backend errors are never shown
//! verbatim; users get a generic retry message.
use std::time::Duration;

use chrono::Utc;
use log::*;
use signal_gate_engine::{
    db_types::NewAccessRecord,
    helpers::is_account_id,
    traits::{AccessApiError, VerificationBackend},
    VerificationApi,
    VerificationError,
    VerificationOutcome,
};
use telegram_tools::{
    AnimationScheduler,
    CallbackQuery,
    MessageGateway,
    ReplyMarkup,
    SendMessage,
    Update,
    User,
};

use crate::{config::ServerConfig, errors::DispatchError, replies};

const FRAME_DELAY: Duration = Duration::from_millis(900);
const INSTRUMENTS_PER_ROW: usize = 3;

/// The slice of the server configuration the dispatcher needs.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    pub instruments: Vec<String>,
    pub referral_link: String,
    pub support_link: String,
    pub admin_ids: Vec<i64>,
    pub check_delay_secs: u64,
}

impl From<&ServerConfig> for DispatcherConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            instruments: config.instruments.clone(),
            referral_link: config.referral_link.clone(),
            support_link: config.support_link.clone(),
            admin_ids: config.admin_ids.clone(),
            check_delay_secs: config.check_delay_secs,
        }
    }
}

pub struct UpdateDispatcher<B, G> {
    verifier: VerificationApi<B>,
    gateway: G,
    config: DispatcherConfig,
}

impl<B, G> UpdateDispatcher<B, G>
where
    B: VerificationBackend,
    G: MessageGateway,
{
    pub fn new(verifier: VerificationApi<B>, gateway: G, config: DispatcherConfig) -> Self {
        Self { verifier, gateway, config }
    }

    /// The single entry point. Never returns an error; anything that goes wrong downstream is logged here.
    pub async fn handle_update(&self, update: Update) {
        let id = update.update_id;
        let result = match (update.message, update.callback_query) {
            (Some(msg), _) => self.handle_message(msg).await,
            (None, Some(cb)) => self.handle_callback(cb).await,
            (None, None) => {
                trace!("🤖️ Ignoring update {id} with no message or callback");
                Ok(())
            },
        };
        if let Err(e) = result {
            warn!("🤖️ Could not handle update {id}: {e}");
        }
    }

    async fn handle_message(&self, msg: telegram_tools::Message) -> Result<(), DispatchError> {
        let Some(user) = msg.from else {
            trace!("🤖️ Ignoring message {} with no sender", msg.message_id);
            return Ok(());
        };
        let chat_id = msg.chat.id;
        let text = msg.text.trim();
        let mut words = text.split_whitespace();
        let command = words.next().unwrap_or_default();
        match command {
            // A /start deep-link parameter (e.g. "register") behaves exactly like a bare /start.
            "/start" => self.start(chat_id, &user).await,
            "/deposit" => self.deposit(chat_id, &user).await,
            "/add" => self.admin_add(chat_id, &user, words.collect::<Vec<_>>()).await,
            "/revoke" => self.admin_revoke(chat_id, &user, words.collect::<Vec<_>>()).await,
            _ if is_account_id(text) => self.submit_account_id(chat_id, &user, text).await,
            _ if self.config.instruments.iter().any(|i| i == text) => {
                self.select_instrument(chat_id, &user, text).await
            },
            _ => {
                debug!("🤖️ Unrecognized message from chat user {}", user.id);
                self.send(SendMessage::new(chat_id, replies::UNKNOWN_COMMAND)).await
            },
        }
    }

    async fn handle_callback(&self, cb: CallbackQuery) -> Result<(), DispatchError> {
        // Ack the button press so the client stops its spinner; a failed ack is not worth aborting over.
        if let Err(e) = self.gateway.answer_callback(&cb.id).await {
            debug!("🤖️ Could not answer callback {}: {e}", cb.id);
        }
        let Some(user) = cb.from else {
            trace!("🤖️ Ignoring callback {} with no sender", cb.id);
            return Ok(());
        };
        let chat_id = cb.message.as_ref().map(|m| m.chat.id).unwrap_or(user.id);
        // Payloads are pipe-delimited and positional: action|arg1|arg2.
        let parts = cb.data.split('|').collect::<Vec<_>>();
        match parts.as_slice() {
            ["signal", instrument, expiry] => self.send_signal(chat_id, &user, instrument, expiry).await,
            ["recheck", account_id] => self.submit_account_id(chat_id, &user, account_id).await,
            ["check_id"] => self.send(SendMessage::new(chat_id, replies::ID_FORMAT_HINT)).await,
            _ => {
                debug!("🤖️ Ignoring unrecognized callback payload from chat user {}", user.id);
                Ok(())
            },
        }
    }

    async fn start(&self, chat_id: i64, user: &User) -> Result<(), DispatchError> {
        let verified = match self.verifier.is_verified(user.id).await {
            Ok(v) => v,
            Err(e) => return self.report_backend_failure(chat_id, e).await,
        };
        let name = user.display_name();
        let msg = if verified {
            SendMessage::new(chat_id, replies::welcome_verified(&name)).with_markup(self.instrument_menu())
        } else {
            SendMessage::new(chat_id, replies::welcome_unverified(&name))
                .with_markup(replies::welcome_keyboard(&self.config.referral_link, &self.config.support_link))
        };
        self.send(msg).await
    }

    /// An account id submission, from a plain message or a recheck button. The checking animation runs either
    /// way; the final frame is the verification outcome (synchronous mode) or a queued notice.
    async fn submit_account_id(&self, chat_id: i64, user: &User, account_id: &str) -> Result<(), DispatchError> {
        let handle = self.gateway.send_message(SendMessage::new(chat_id, replies::CHECK_STARTED)).await?;
        let animation = AnimationScheduler::new(self.gateway.clone(), handle);
        animation.play(&replies::checking_frames(), FRAME_DELAY).await;
        let submission = NewAccessRecord::new(user.id, account_id, user.display_name())
            .with_username(user.username.as_deref());
        if self.config.check_delay_secs > 0 {
            let scheduled = Utc::now() + chrono::Duration::seconds(self.config.check_delay_secs as i64);
            match self.verifier.schedule_check(submission, scheduled).await {
                Ok(id) => {
                    debug!("🤖️ Queued check {id} for chat user {}", user.id);
                    animation.finish(replies::check_queued(self.config.check_delay_secs)).await?;
                },
                Err(e) => {
                    error!("🤖️ Could not queue a check for chat user {}: {e}", user.id);
                    animation.finish(replies::TRY_AGAIN).await?;
                },
            }
            return Ok(());
        }
        match self.verifier.verify_submission(submission).await {
            Ok(outcome) => {
                animation.finish(replies::outcome_text(&outcome, &user.display_name())).await?;
                self.send_outcome_followup(chat_id, account_id, &outcome).await
            },
            Err(e) => {
                error!("🤖️ Verification failed for chat user {}: {e}", user.id);
                animation.finish(replies::TRY_AGAIN).await?;
                Ok(())
            },
        }
    }

    /// A second message after the outcome edit: the instrument menu for verified users, or the retry/register
    /// buttons for the others.
    async fn send_outcome_followup(
        &self,
        chat_id: i64,
        account_id: &str,
        outcome: &VerificationOutcome,
    ) -> Result<(), DispatchError> {
        match outcome {
            VerificationOutcome::Verified(_) | VerificationOutcome::AlreadyVerified(_) => {
                self.send(SendMessage::new(chat_id, replies::PICK_INSTRUMENT).with_markup(self.instrument_menu()))
                    .await
            },
            _ => {
                let keyboard = replies::outcome_keyboard(outcome, &account_id.into(), &self.config.referral_link);
                match keyboard {
                    Some(markup) => {
                        self.send(SendMessage::new(chat_id, replies::WHAT_NEXT).with_markup(markup)).await
                    },
                    None => Ok(()),
                }
            },
        }
    }

    async fn select_instrument(&self, chat_id: i64, user: &User, instrument: &str) -> Result<(), DispatchError> {
        if !self.check_access(chat_id, user).await? {
            return Ok(());
        }
        self.send(
            SendMessage::new(chat_id, replies::choose_expiry(instrument))
                .with_markup(replies::expiry_keyboard(instrument)),
        )
        .await
    }

    async fn send_signal(
        &self,
        chat_id: i64,
        user: &User,
        instrument: &str,
        expiry: &str,
    ) -> Result<(), DispatchError> {
        if !self.check_access(chat_id, user).await? {
            return Ok(());
        }
        let handle = self.gateway.send_message(SendMessage::new(chat_id, replies::SIGNAL_STARTED)).await?;
        let animation = AnimationScheduler::new(self.gateway.clone(), handle);
        animation.play(&replies::analyzing_frames(instrument), FRAME_DELAY).await;
        let up = rand::random::<bool>();
        animation.finish(replies::signal_text(instrument, expiry, up)).await?;
        Ok(())
    }

    async fn deposit(&self, chat_id: i64, user: &User) -> Result<(), DispatchError> {
        match self.verifier.recorded_ledger_for_user(user.id).await {
            Ok(Some(record)) => self.send(SendMessage::new(chat_id, replies::deposit_total(record.total_deposit))).await,
            Ok(None) => self.deny(chat_id).await,
            Err(e) => self.report_backend_failure(chat_id, e).await,
        }
    }

    async fn admin_add(&self, chat_id: i64, user: &User, args: Vec<&str>) -> Result<(), DispatchError> {
        if !self.config.admin_ids.contains(&user.id) {
            return self.send(SendMessage::new(chat_id, replies::ADMIN_ONLY)).await;
        }
        let parsed = match args.as_slice() {
            [target, account_id] => target.parse::<i64>().ok().map(|t| (t, *account_id)),
            _ => None,
        };
        let Some((target, account_id)) = parsed else {
            return self.send(SendMessage::new(chat_id, replies::ADD_USAGE)).await;
        };
        let grant = NewAccessRecord::new(target, account_id, "Manual grant");
        match self.verifier.grant_access(grant).await {
            Ok(record) => {
                info!("🤖️ Admin {} granted access to chat user {target}", user.id);
                self.send(SendMessage::new(chat_id, replies::access_granted(target, record.account_id.as_str())))
                    .await
            },
            Err(VerificationError::Access(AccessApiError::AccountAlreadyClaimed { claimed_by, .. })) => {
                self.send(SendMessage::new(chat_id, replies::account_claimed_by(claimed_by))).await
            },
            Err(e) => self.report_backend_failure(chat_id, e).await,
        }
    }

    async fn admin_revoke(&self, chat_id: i64, user: &User, args: Vec<&str>) -> Result<(), DispatchError> {
        if !self.config.admin_ids.contains(&user.id) {
            return self.send(SendMessage::new(chat_id, replies::ADMIN_ONLY)).await;
        }
        let target = match args.as_slice() {
            [target] => target.parse::<i64>().ok(),
            _ => None,
        };
        let Some(target) = target else {
            return self.send(SendMessage::new(chat_id, replies::REVOKE_USAGE)).await;
        };
        match self.verifier.revoke_access(target).await {
            Ok(true) => {
                info!("🤖️ Admin {} revoked access for chat user {target}", user.id);
                self.send(SendMessage::new(chat_id, replies::access_revoked(target))).await
            },
            Ok(false) => self.send(SendMessage::new(chat_id, replies::no_access_record(target))).await,
            Err(e) => self.report_backend_failure(chat_id, e).await,
        }
    }

    /// The gate in front of every restricted action. Sends the denial message itself when the answer is no.
    async fn check_access(&self, chat_id: i64, user: &User) -> Result<bool, DispatchError> {
        match self.verifier.is_verified(user.id).await {
            Ok(true) => Ok(true),
            Ok(false) => {
                debug!("🧑️ Denying chat user {} access to a restricted action", user.id);
                self.send(
                    SendMessage::new(chat_id, replies::NOT_VERIFIED)
                        .with_markup(replies::welcome_keyboard(&self.config.referral_link, &self.config.support_link)),
                )
                .await?;
                Ok(false)
            },
            Err(e) => {
                self.report_backend_failure(chat_id, e).await?;
                Ok(false)
            },
        }
    }

    async fn deny(&self, chat_id: i64) -> Result<(), DispatchError> {
        self.send(
            SendMessage::new(chat_id, replies::NOT_VERIFIED)
                .with_markup(replies::welcome_keyboard(&self.config.referral_link, &self.config.support_link)),
        )
        .await
    }

    async fn report_backend_failure(&self, chat_id: i64, e: VerificationError) -> Result<(), DispatchError> {
        error!("🤖️ Backend error while handling a chat update: {e}");
        self.send(SendMessage::new(chat_id, replies::TRY_AGAIN)).await
    }

    fn instrument_menu(&self) -> ReplyMarkup {
        ReplyMarkup::menu(&self.config.instruments, INSTRUMENTS_PER_ROW)
    }

    async fn send(&self, msg: SendMessage) -> Result<(), DispatchError> {
        self.gateway.send_message(msg).await?;
        Ok(())
    }
}
