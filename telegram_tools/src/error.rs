use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid request: {0}")]
    RequestError(String),
    #[error("Invalid response: {0}")]
    ResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Bot API call failed. Error {status}. {message}")]
    ApiError { status: u16, message: String },
}
