use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::SeatGroup;

/// Ключ подписки в формате `"{chat_id}_{theater_id}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionKey(String);

impl SubscriptionKey {
    pub fn new(chat_id: i64, target_id: &str) -> Self {
        Self(format!("{}_{}", chat_id, target_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Отслеживаемый спектакль для одного чата.
///
/// Имена полей в файле совпадают с форматом базы, который уже лежит у
/// пользователей (`theater_id`, `min_seats`, `max_row` и т.д.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub chat_id: i64,
    #[serde(rename = "theater_id")]
    pub target_id: String,
    #[serde(rename = "min_seats")]
    pub min_run: u32,
    pub created_at: NaiveDateTime,
    #[serde(rename = "max_row", default, skip_serializing_if = "Option::is_none")]
    pub row_ceiling: Option<u32>,
    #[serde(rename = "original_url", default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(rename = "last_available_groups", default)]
    pub last_groups: Vec<SeatGroup>,
}

impl Subscription {
    pub fn new(
        chat_id: i64,
        target_id: impl Into<String>,
        min_run: u32,
        row_ceiling: Option<u32>,
        source_url: Option<String>,
    ) -> Self {
        Self {
            chat_id,
            target_id: target_id.into(),
            min_run,
            created_at: chrono::Local::now().naive_local(),
            row_ceiling,
            source_url,
            last_groups: Vec::new(),
        }
    }

    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey::new(self.chat_id, &self.target_id)
    }
}
