//! Telegram Bot API client.
//!
//! A thin wrapper around the handful of Bot API methods the signal gate uses for its outbound traffic
//! (`sendMessage`, `editMessageText`, `deleteMessage`, `answerCallbackQuery`), plus the [`AnimationScheduler`],
//! which drives the decorative multi-step message-edit sequences.
//!
//! Outbound calls carry a bounded timeout and are never retried here. Retry policy, if any, belongs to callers.
mod animation;
mod api;
mod config;
mod error;

mod data_objects;

pub use animation::AnimationScheduler;
pub use api::{MessageGateway, TelegramApi};
pub use config::TelegramConfig;
pub use data_objects::{
    CallbackQuery,
    Chat,
    EditMessageText,
    InlineKeyboardButton,
    Message,
    MessageHandle,
    ReplyMarkup,
    SendMessage,
    Update,
    User,
};
pub use error::TelegramApiError;
