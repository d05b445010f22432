use serde::{Deserialize, Serialize};

//--------------------------------------   Inbound envelope   --------------------------------------------------------

/// One inbound update from the Bot API webhook. Exactly one of `message` / `callback_query` is expected to be
/// populated; anything else is ignored by the dispatcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// "First Last", falling back to a friendly placeholder like the bots always did.
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<&str>>()
            .join(" ");
        if name.is_empty() {
            "Trader".to_string()
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Option<User>,
    #[serde(default)]
    pub data: String,
    pub message: Option<Message>,
}

//--------------------------------------   Outbound payloads   -------------------------------------------------------

/// A sent message that can be edited or deleted later. The pair of ids is all the Bot API needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMessage {
    pub fn new<S: Into<String>>(chat_id: i64, text: S) -> Self {
        Self { chat_id, text: text.into(), ..Default::default() }
    }

    pub fn with_markup(mut self, markup: ReplyMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageText {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

impl EditMessageText {
    pub fn new<S: Into<String>>(handle: &MessageHandle, text: S) -> Self {
        Self { chat_id: handle.chat_id, message_id: handle.message_id, text: text.into() }
    }
}

//--------------------------------------       Keyboards       -------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    InlineKeyboard { inline_keyboard: Vec<Vec<InlineKeyboardButton>> },
    ReplyKeyboard { keyboard: Vec<Vec<String>>, resize_keyboard: bool },
}

impl ReplyMarkup {
    pub fn inline(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self::InlineKeyboard { inline_keyboard: rows }
    }

    /// A reply keyboard with `per_row` options per row, as the bots lay out their instrument menus.
    pub fn menu(options: &[String], per_row: usize) -> Self {
        let keyboard = options.chunks(per_row.max(1)).map(|row| row.to_vec()).collect();
        Self::ReplyKeyboard { keyboard, resize_keyboard: true }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl InlineKeyboardButton {
    pub fn url<S: Into<String>, U: Into<String>>(text: S, url: U) -> Self {
        Self { text: text.into(), url: Some(url.into()), callback_data: None }
    }

    pub fn callback<S: Into<String>, D: Into<String>>(text: S, data: D) -> Self {
        Self { text: text.into(), url: None, callback_data: Some(data.into()) }
    }
}
