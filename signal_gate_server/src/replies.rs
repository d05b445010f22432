//! Every chat-facing string in one place, in the voice the bots have always used. Handlers decide *when* to say
//! something; this module decides *what* it sounds like.
use sg_common::UsdCents;
use signal_gate_engine::{db_types::AccountId, VerificationOutcome};
use telegram_tools::{InlineKeyboardButton, ReplyMarkup};

pub const CHECK_STARTED: &str = "🔍 Checking your ID...";
pub const TRY_AGAIN: &str = "😕 Something went wrong on our side. Please try again in a minute.";
pub const UNKNOWN_COMMAND: &str = "🤔 I didn't understand that. Send your trader ID, or /start to see the menu.";
pub const ID_FORMAT_HINT: &str =
    "🆔 Your trader ID is the number of 6 or more digits shown in your broker profile. Just send it here as a \
     plain message.";
pub const NOT_VERIFIED: &str =
    "🔒 Signals are available after verification. Register through our link and make your first deposit, then \
     send me your trader ID.";
pub const ADMIN_ONLY: &str = "This command is reserved for administrators.";
pub const ADD_USAGE: &str = "Usage: /add <chat_user_id> <account_id>";
pub const REVOKE_USAGE: &str = "Usage: /revoke <chat_user_id>";
pub const PICK_INSTRUMENT: &str = "📋 Pick an instrument:";
pub const WHAT_NEXT: &str = "👇 What would you like to do?";
pub const SIGNAL_STARTED: &str = "🛰 Preparing your signal...";

pub fn choose_expiry(instrument: &str) -> String {
    format!("⏰ Choose an expiry for {instrument}:")
}

pub fn access_granted(chat_user_id: i64, account_id: &str) -> String {
    format!("✅ Chat user {chat_user_id} now has access, linked to account {account_id}.")
}

pub fn access_revoked(chat_user_id: i64) -> String {
    format!("🗑 Access revoked for chat user {chat_user_id}.")
}

pub fn no_access_record(chat_user_id: i64) -> String {
    format!("Chat user {chat_user_id} has no access record.")
}

pub fn account_claimed_by(claimed_by: i64) -> String {
    format!("⚠️ That account id is already claimed by chat user {claimed_by}.")
}

pub fn checking_frames() -> Vec<String> {
    ["📡 Connecting to the partner API...", "📥 Requesting your account data...", "🧾 Checking deposit history..."]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn analyzing_frames(instrument: &str) -> Vec<String> {
    [
        format!("📊 Analyzing {instrument}..."),
        "📈 Scanning the indicators...".to_string(),
        "🎯 Computing the entry point...".to_string(),
    ]
    .to_vec()
}

/// Knows the names the verifier uses. `name` is the submitter's display name; `threshold` only shows up in the
/// below-threshold nudge.
pub fn outcome_text(outcome: &VerificationOutcome, name: &str) -> String {
    match outcome {
        VerificationOutcome::AlreadyVerified(_) => {
            format!("✅ {name}, you are already verified. Pick an instrument to get a signal!")
        },
        VerificationOutcome::Verified(_) => {
            format!("🎉 Congratulations {name}, your account is verified! Pick an instrument to get a signal.")
        },
        VerificationOutcome::BelowThreshold { total, threshold } => format!(
            "⏳ Your account is registered, but your deposit total is {total} of the {threshold} required. Top up \
             and check again!"
        ),
        VerificationOutcome::Unlinked => {
            "❌ I couldn't find that ID among our partner registrations. Make sure you signed up through our link, \
             then check again."
                .to_string()
        },
        VerificationOutcome::AlreadyClaimed { .. } => {
            "⚠️ That trader ID is already linked to another Telegram account. If this is your ID, contact support."
                .to_string()
        },
    }
}

/// The follow-up keyboard for a non-final outcome, if one applies. Verified outcomes get the instrument menu
/// (from the dispatcher) instead.
pub fn outcome_keyboard(
    outcome: &VerificationOutcome,
    account_id: &AccountId,
    referral_link: &str,
) -> Option<ReplyMarkup> {
    match outcome {
        VerificationOutcome::BelowThreshold { .. } => Some(ReplyMarkup::inline(vec![vec![
            InlineKeyboardButton::callback("🔄 Check again", format!("recheck|{account_id}")),
        ]])),
        VerificationOutcome::Unlinked => {
            let mut rows = Vec::new();
            if !referral_link.is_empty() {
                rows.push(vec![InlineKeyboardButton::url("📝 Register", referral_link)]);
            }
            rows.push(vec![InlineKeyboardButton::callback("🔄 Check again", format!("recheck|{account_id}"))]);
            rows.push(vec![InlineKeyboardButton::callback("❓ Where is my ID?", "check_id")]);
            Some(ReplyMarkup::inline(rows))
        },
        _ => None,
    }
}

pub fn welcome_verified(name: &str) -> String {
    format!("👋 Welcome back, {name}! Pick an instrument below to get a signal.")
}

pub fn welcome_unverified(name: &str) -> String {
    format!(
        "👋 Hi {name}! To unlock trading signals:\n\n1️⃣ Register with our partner broker through the button \
         below\n2️⃣ Make your first deposit\n3️⃣ Send me your trader ID\n\nI'll verify it and open the signal menu \
         for you."
    )
}

pub fn welcome_keyboard(referral_link: &str, support_link: &str) -> ReplyMarkup {
    let mut rows = Vec::new();
    if !referral_link.is_empty() {
        rows.push(vec![InlineKeyboardButton::url("📝 Open an account", referral_link)]);
    }
    if !support_link.is_empty() {
        rows.push(vec![InlineKeyboardButton::url("💬 Support", support_link)]);
    }
    rows.push(vec![InlineKeyboardButton::callback("❓ Where is my ID?", "check_id")]);
    ReplyMarkup::inline(rows)
}

pub const EXPIRY_OPTIONS: [&str; 3] = ["1 min", "5 min", "15 min"];

pub fn expiry_keyboard(instrument: &str) -> ReplyMarkup {
    let row = EXPIRY_OPTIONS
        .iter()
        .map(|expiry| InlineKeyboardButton::callback(*expiry, format!("signal|{instrument}|{expiry}")))
        .collect::<Vec<_>>();
    ReplyMarkup::inline(vec![row])
}

pub fn signal_text(instrument: &str, expiry: &str, up: bool) -> String {
    let direction = if up { "⬆️ UP" } else { "⬇️ DOWN" };
    format!("📣 Signal for {instrument}\n\nDirection: {direction}\nExpiry: {expiry}\n\nGood luck! 🍀")
}

pub fn deposit_total(total: UsdCents) -> String {
    format!("💰 Your recorded deposit total is {total}.")
}

pub fn check_queued(delay_secs: u64) -> String {
    format!("⏱ Your ID is in the verification queue. I'll get back to you in about {delay_secs} seconds.")
}
