use std::env;

use log::*;
use sg_common::{Secret, UsdCents};
use telegram_tools::TelegramConfig;

use crate::errors::ServerError;

const DEFAULT_SG_HOST: &str = "127.0.0.1";
const DEFAULT_SG_PORT: u16 = 8360;
const DEFAULT_MIN_DEPOSIT: UsdCents = UsdCents::from_dollars(20);
const DEFAULT_CHECK_DELAY_SECS: u64 = 60;
const DEFAULT_INSTRUMENTS: [&str; 6] = ["EUR/USD", "GBP/USD", "USD/JPY", "AUD/CAD", "BTC/USD", "ETH/USD"];

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Total deposit a broker account must reach before its chat user is granted access.
    pub min_deposit: UsdCents,
    /// Seconds between an account id submission and its verification check. 0 checks synchronously, in the
    /// webhook's detached task, instead of going through the durable queue.
    pub check_delay_secs: u64,
    /// Broker sign-up link offered to unverified users.
    pub referral_link: String,
    pub support_link: String,
    /// Chat user ids allowed to run /add and /revoke.
    pub admin_ids: Vec<i64>,
    /// The tradable instruments offered on the signal menu. Plain message text matching one of these is treated
    /// as an instrument selection.
    pub instruments: Vec<String>,
    /// If set, postback requests must carry a matching ?token= query parameter.
    pub postback_token: Option<Secret>,
    pub telegram: TelegramConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SG_HOST.to_string(),
            port: DEFAULT_SG_PORT,
            database_url: String::default(),
            min_deposit: DEFAULT_MIN_DEPOSIT,
            check_delay_secs: DEFAULT_CHECK_DELAY_SECS,
            referral_link: String::default(),
            support_link: String::default(),
            admin_ids: Vec::new(),
            instruments: DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
            postback_token: None,
            telegram: TelegramConfig::new(Secret::default()),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    /// Loads the configuration from the environment. Every variable except `SG_BOT_TOKEN` has a default; a bot
    /// that cannot send messages is useless, so a missing token aborts startup.
    pub fn try_from_env() -> Result<Self, ServerError> {
        let host = env::var("SG_HOST").ok().unwrap_or_else(|| DEFAULT_SG_HOST.into());
        let port = env::var("SG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SG_PORT. {e} Using the default, {DEFAULT_SG_PORT}, instead."
                    );
                    DEFAULT_SG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SG_PORT);
        let database_url = env::var("SG_DATABASE_URL").ok().unwrap_or_else(signal_gate_engine::db_url);
        let bot_token = env::var("SG_BOT_TOKEN").map_err(|_| {
            ServerError::ConfigurationError(
                "SG_BOT_TOKEN is not set. Set it to the bot token issued by @BotFather.".into(),
            )
        })?;
        let mut telegram = TelegramConfig::new(Secret::new(bot_token));
        if let Ok(base) = env::var("SG_TELEGRAM_API_BASE") {
            info!("🪛️ Bot API base url overridden to {base}");
            telegram.api_base = base;
        }
        let min_deposit = env::var("SG_MIN_DEPOSIT")
            .map(|s| {
                s.parse::<UsdCents>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid dollar amount for SG_MIN_DEPOSIT. {e} Using the default, \
                         {DEFAULT_MIN_DEPOSIT}, instead."
                    );
                    DEFAULT_MIN_DEPOSIT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MIN_DEPOSIT);
        let check_delay_secs = env::var("SG_CHECK_DELAY_SECS")
            .map(|s| {
                s.parse::<u64>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not valid for SG_CHECK_DELAY_SECS. {e} Using {DEFAULT_CHECK_DELAY_SECS}s.");
                    DEFAULT_CHECK_DELAY_SECS
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CHECK_DELAY_SECS);
        let referral_link = env::var("SG_REFERRAL_LINK").ok().unwrap_or_else(|| {
            warn!("🪛️ SG_REFERRAL_LINK is not set. Unverified users will not be offered a sign-up link.");
            String::default()
        });
        let support_link = env::var("SG_SUPPORT_LINK").ok().unwrap_or_else(|| {
            warn!("🪛️ SG_SUPPORT_LINK is not set. Unverified users will not be offered a support contact.");
            String::default()
        });
        let admin_ids = env::var("SG_ADMIN_IDS").ok().map(|s| parse_id_list(&s)).unwrap_or_default();
        if admin_ids.is_empty() {
            info!("🪛️ No admin ids configured. /add and /revoke are disabled.");
        }
        let instruments = env::var("SG_INSTRUMENTS")
            .ok()
            .map(|s| s.split(',').map(|i| i.trim().to_string()).filter(|i| !i.is_empty()).collect::<Vec<_>>())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect());
        let postback_token = env::var("SG_POSTBACK_TOKEN").ok().map(Secret::new);
        if postback_token.is_none() {
            info!("🪛️ SG_POSTBACK_TOKEN is not set. Postback requests will not be authenticated.");
        }
        Ok(Self {
            host,
            port,
            database_url,
            min_deposit,
            check_delay_secs,
            referral_link,
            support_link,
            admin_ids,
            instruments,
            postback_token,
            telegram,
        })
    }
}

fn parse_id_list(s: &str) -> Vec<i64> {
    s.split(',')
        .filter_map(|id| {
            let id = id.trim();
            if id.is_empty() {
                return None;
            }
            id.parse::<i64>()
                .map_err(|e| {
                    warn!("🪛️ Ignoring invalid chat user id ({id}) in SG_ADMIN_IDS: {e}");
                })
                .ok()
        })
        .collect()
}
