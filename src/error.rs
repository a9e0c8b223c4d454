use thiserror::Error;

use crate::models::SubscriptionKey;

/// Ошибки загрузки схемы зала.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chairmap endpoint returned status {0}")]
    Status(u16),
}

/// Ошибки доставки сообщений в Telegram.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Ошибки файла с подписками.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed store file: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("Failed to encode store: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Ошибки операций над подписками, которые видит диалог с пользователем.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Subscription {0} not found")]
    NotFound(SubscriptionKey),

    #[error("Seat map unavailable: {0}")]
    Fetch(#[from] FetchError),
}
