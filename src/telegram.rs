//! telegram.rs
//!
//! Тонкий клиент Telegram Bot API поверх reqwest: отправка сообщений и
//! long polling входящих апдейтов. Отправка сообщений это и есть канал
//! уведомлений для мониторинга (`NotifySink`).

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::{config::TelegramConfig, error::NotifyError};

/// Канал доставки уведомлений. Доставка best-effort.
#[async_trait]
pub trait NotifySink: Send + Sync {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<(), NotifyError>;
}

// --- Модели Bot API ---

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

/// Постоянная клавиатура с кнопками главного меню.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self {
            keyboard: rows
                .iter()
                .map(|row| row.iter().map(|text| KeyboardButton { text: text.to_string() }).collect())
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a ReplyKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

/// Клиент Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    base_url: String,
    http_client: reqwest::Client,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self, NotifyError> {
        Ok(Self {
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            http_client: reqwest::Client::builder().build()?,
            poll_timeout,
        })
    }

    pub fn from_config(config: &TelegramConfig, token: &str) -> Result<Self, NotifyError> {
        Self::new(&config.api_url, token, Duration::from_secs(config.poll_timeout_secs))
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, NotifyError> {
        let mut request = self
            .http_client
            .post(format!("{}/{}", self.base_url, method))
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response: ApiResponse<T> = request.send().await?.json().await?;

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(NotifyError::Api(
                response
                    .description
                    .unwrap_or_else(|| format!("{} failed without description", method)),
            )),
        }
    }

    /// Отправляет текст в чат, опционально с клавиатурой меню.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&ReplyKeyboardMarkup>,
    ) -> Result<(), NotifyError> {
        let request = SendMessageRequest { chat_id, text, reply_markup };
        let _: serde_json::Value = self.call("sendMessage", &request, None).await?;
        Ok(())
    }

    /// Long polling новых апдейтов начиная с `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, NotifyError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: ["message"],
        };
        // HTTP-таймаут должен быть больше серверного ожидания
        let http_timeout = self.poll_timeout + Duration::from_secs(10);
        self.call("getUpdates", &request, Some(http_timeout)).await
    }
}

#[async_trait]
impl NotifySink for TelegramClient {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        self.send_message(chat_id, text, None).await.map_err(|e| {
            warn!("Telegram delivery to chat {} failed: {}", chat_id, e);
            e
        })
    }
}
