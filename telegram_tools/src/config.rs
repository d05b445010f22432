use std::time::Duration;

use sg_common::Secret;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Secret,
    /// Base url for the Bot API. Only overridden in tests.
    pub api_base: String,
    pub timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: Secret) -> Self {
        Self { bot_token, api_base: DEFAULT_API_BASE.to_string(), timeout: DEFAULT_TIMEOUT }
    }
}
