use std::sync::Arc;

use log::*;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::TelegramConfig,
    data_objects::{EditMessageText, MessageHandle, SendMessage},
    TelegramApiError,
};

/// The outbound message surface the rest of the system talks to. [`TelegramApi`] is the real implementation;
/// dispatcher and worker code is generic over this trait so tests can substitute a mock.
#[allow(async_fn_in_trait)]
pub trait MessageGateway: Clone {
    async fn send_message(&self, msg: SendMessage) -> Result<MessageHandle, TelegramApiError>;
    async fn edit_message(&self, edit: EditMessageText) -> Result<(), TelegramApiError>;
    async fn delete_message(&self, handle: &MessageHandle) -> Result<(), TelegramApiError>;
    async fn answer_callback(&self, callback_id: &str) -> Result<(), TelegramApiError>;
}

#[derive(Clone)]
pub struct TelegramApi {
    config: TelegramConfig,
    client: Arc<Client>,
}

impl TelegramApi {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TelegramApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.config.api_base, self.config.bot_token.reveal())
    }

    /// Posts one Bot API method call and unwraps the standard `{ok, result}` envelope.
    pub async fn call<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramApiError> {
        trace!("✈️ Calling Bot API method {method}");
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramApiError::RequestError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| TelegramApiError::ResponseError(e.to_string()))?;
            return Err(TelegramApiError::ApiError { status, message });
        }
        let envelope = response.json::<Value>().await.map_err(|e| TelegramApiError::JsonError(e.to_string()))?;
        if !envelope["ok"].as_bool().unwrap_or(false) {
            let message = envelope["description"].as_str().unwrap_or("unknown error").to_string();
            return Err(TelegramApiError::ApiError { status: 200, message });
        }
        serde_json::from_value(envelope["result"].clone()).map_err(|e| TelegramApiError::JsonError(e.to_string()))
    }
}

impl MessageGateway for TelegramApi {
    async fn send_message(&self, msg: SendMessage) -> Result<MessageHandle, TelegramApiError> {
        let chat_id = msg.chat_id;
        let result: Value = self.call("sendMessage", &msg).await?;
        let message_id = result["message_id"]
            .as_i64()
            .ok_or_else(|| TelegramApiError::ResponseError("sendMessage result had no message_id".to_string()))?;
        Ok(MessageHandle { chat_id, message_id })
    }

    async fn edit_message(&self, edit: EditMessageText) -> Result<(), TelegramApiError> {
        let _: Value = self.call("editMessageText", &edit).await?;
        Ok(())
    }

    async fn delete_message(&self, handle: &MessageHandle) -> Result<(), TelegramApiError> {
        let body = serde_json::json!({"chat_id": handle.chat_id, "message_id": handle.message_id});
        let _: Value = self.call("deleteMessage", &body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TelegramApiError> {
        let body = serde_json::json!({"callback_query_id": callback_id});
        let _: Value = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }
}
