//! dialogue.rs
//!
//! Диалог с пользователем без привязки к транспорту: на вход текст из чата,
//! на выход текст ответа. Состояние каждого чата (`InteractionState`) живёт в
//! памяти и не переживает перезапуск, подписки живут в хранилище.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::{
    error::AppError,
    models::{InteractionState, SubscriptionKey, TargetIntent},
    seatmap::extract_theater_id,
    services::{messages, subscriptions::SubscriptionService},
};

/// Команды главного меню: слэш-команды и подписи кнопок.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    Find,
    Monitor,
    MyShows,
    Stop(Option<String>),
    MaxRow(Option<String>),
    Help,
    Start,
}

impl MenuCommand {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text {
            messages::BUTTON_FIND => return Some(Self::Find),
            messages::BUTTON_MONITOR => return Some(Self::Monitor),
            messages::BUTTON_MY_SHOWS => return Some(Self::MyShows),
            messages::BUTTON_STOP => return Some(Self::Stop(None)),
            messages::BUTTON_HELP => return Some(Self::Help),
            _ => {}
        }

        let mut parts = text.split_whitespace();
        let command = parts.next()?;
        if !command.starts_with('/') {
            return None;
        }
        // "/stop@my_bot" в группах
        let command = command.split('@').next().unwrap_or(command);
        let argument = parts.next().map(str::to_string);

        match command {
            "/find" => Some(Self::Find),
            "/monitor" => Some(Self::Monitor),
            "/myshows" => Some(Self::MyShows),
            "/stop" => Some(Self::Stop(argument)),
            "/maxrow" => Some(Self::MaxRow(argument)),
            "/help" => Some(Self::Help),
            "/start" => Some(Self::Start),
            _ => None,
        }
    }
}

/// Только цифры, без знака и пробелов внутри.
fn parse_number(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn looks_like_url(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("http://") || text.starts_with("https://")
}

fn ceiling_from_input(value: u32) -> Option<u32> {
    (value > 0).then_some(value)
}

pub struct Dialogue {
    service: Arc<SubscriptionService>,
    states: Mutex<HashMap<i64, InteractionState>>,
}

impl Dialogue {
    pub fn new(service: Arc<SubscriptionService>) -> Self {
        Self {
            service,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub async fn state(&self, chat_id: i64) -> InteractionState {
        self.states
            .lock()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn set_state(&self, chat_id: i64, state: InteractionState) {
        let mut states = self.states.lock().await;
        if state.is_awaiting_input() {
            states.insert(chat_id, state);
        } else {
            states.remove(&chat_id);
        }
    }

    /// Обрабатывает одно входящее сообщение и возвращает ответ.
    pub async fn handle(&self, chat_id: i64, text: &str) -> String {
        // Кнопка меню сбрасывает любое ожидание ввода
        if let Some(command) = MenuCommand::parse(text) {
            debug!("Chat {} menu command {:?}", chat_id, command);
            self.set_state(chat_id, InteractionState::Idle).await;
            return self.handle_command(chat_id, command).await;
        }

        match self.state(chat_id).await {
            InteractionState::Idle => self.handle_idle(text).await,
            InteractionState::AwaitingTarget { intent } => {
                self.handle_target(chat_id, intent, text).await
            }
            InteractionState::AwaitingMinRun { target, source_url } => {
                self.handle_min_run(chat_id, target, source_url, text).await
            }
            InteractionState::AwaitingRowCeiling { target, source_url, min_run } => {
                self.handle_row_ceiling(chat_id, target, source_url, min_run, text)
                    .await
            }
            InteractionState::AwaitingNewRowCeiling { key } => {
                self.handle_new_row_ceiling(chat_id, key, text).await
            }
        }
    }

    async fn handle_command(&self, chat_id: i64, command: MenuCommand) -> String {
        match command {
            MenuCommand::Start => messages::WELCOME.to_string(),
            MenuCommand::Help => messages::HELP.to_string(),
            MenuCommand::Find => {
                self.set_state(chat_id, InteractionState::AwaitingTarget { intent: TargetIntent::Find })
                    .await;
                messages::ASK_URL.to_string()
            }
            MenuCommand::Monitor => {
                self.set_state(
                    chat_id,
                    InteractionState::AwaitingTarget { intent: TargetIntent::Monitor },
                )
                .await;
                messages::ASK_MONITOR_URL.to_string()
            }
            MenuCommand::MyShows => {
                messages::subscription_list(&self.service.list_subscriptions(chat_id).await)
            }
            MenuCommand::Stop(None) => {
                messages::stop_menu(&self.service.list_subscriptions(chat_id).await)
            }
            MenuCommand::Stop(Some(target)) => {
                let key = SubscriptionKey::new(chat_id, &target);
                match self.service.delete_subscription(&key).await {
                    Ok(removed) => messages::monitoring_stopped(&removed),
                    Err(e) => self.render_error(e),
                }
            }
            MenuCommand::MaxRow(None) => {
                messages::subscription_list(&self.service.list_subscriptions(chat_id).await)
            }
            MenuCommand::MaxRow(Some(target)) => {
                let key = SubscriptionKey::new(chat_id, &target);
                if !self.service.store().contains(&key).await {
                    return messages::SHOW_NOT_FOUND.to_string();
                }
                self.set_state(chat_id, InteractionState::AwaitingNewRowCeiling { key })
                    .await;
                messages::ASK_NEW_MAX_ROW.to_string()
            }
        }
    }

    async fn handle_idle(&self, text: &str) -> String {
        if !looks_like_url(text) {
            return messages::UNKNOWN_INPUT.to_string();
        }
        match extract_theater_id(text) {
            Some(target) => self.find_now(&target).await,
            None => messages::INVALID_URL.to_string(),
        }
    }

    async fn handle_target(&self, chat_id: i64, intent: TargetIntent, text: &str) -> String {
        let Some(target) = extract_theater_id(text) else {
            // состояние не меняем, ждём нормальную ссылку
            return messages::INVALID_URL.to_string();
        };

        match intent {
            TargetIntent::Find => {
                self.set_state(chat_id, InteractionState::Idle).await;
                self.find_now(&target).await
            }
            TargetIntent::Monitor => {
                let reply = format!("{}\n{}", messages::found_show(&target), messages::ASK_MIN_SEATS);
                self.set_state(
                    chat_id,
                    InteractionState::AwaitingMinRun {
                        target,
                        source_url: text.trim().to_string(),
                    },
                )
                .await;
                reply
            }
        }
    }

    async fn handle_min_run(
        &self,
        chat_id: i64,
        target: String,
        source_url: String,
        text: &str,
    ) -> String {
        match parse_number(text) {
            None => messages::INVALID_NUMBER.to_string(),
            Some(0) => messages::INVALID_MIN_SEATS.to_string(),
            Some(min_run) => {
                self.set_state(
                    chat_id,
                    InteractionState::AwaitingRowCeiling { target, source_url, min_run },
                )
                .await;
                messages::ASK_MAX_ROW.to_string()
            }
        }
    }

    async fn handle_row_ceiling(
        &self,
        chat_id: i64,
        target: String,
        source_url: String,
        min_run: u32,
        text: &str,
    ) -> String {
        let Some(value) = parse_number(text) else {
            return messages::INVALID_MAX_ROW.to_string();
        };

        self.set_state(chat_id, InteractionState::Idle).await;
        match self
            .service
            .create_subscription(chat_id, &target, min_run, ceiling_from_input(value), Some(source_url))
            .await
        {
            Ok(subscription) => messages::monitoring_started(&subscription),
            Err(e) => self.render_error(e),
        }
    }

    async fn handle_new_row_ceiling(&self, chat_id: i64, key: SubscriptionKey, text: &str) -> String {
        let Some(value) = parse_number(text) else {
            return messages::INVALID_MAX_ROW.to_string();
        };

        self.set_state(chat_id, InteractionState::Idle).await;
        match self.service.update_row_ceiling(&key, ceiling_from_input(value)).await {
            Ok(subscription) => messages::max_row_updated(&subscription),
            Err(e) => self.render_error(e),
        }
    }

    async fn find_now(&self, target: &str) -> String {
        let header = messages::found_show(target);
        match self.service.find_now(target).await {
            Ok(result) if result.seats_total == 0 => format!("{}\n{}", header, messages::NO_SEATS),
            Ok(result) => format!("{}\n{}", header, messages::find_result(&result.groups)),
            Err(e) => {
                error!("Find for show {} failed: {}", target, e);
                format!("{}\n{}", header, messages::NO_SEATS)
            }
        }
    }

    fn render_error(&self, error: AppError) -> String {
        match error {
            AppError::NotFound(_) => messages::SHOW_NOT_FOUND.to_string(),
            AppError::Validation(_) => messages::INVALID_NUMBER.to_string(),
            AppError::Fetch(e) => {
                error!("Seat map fetch failed: {}", e);
                messages::SOMETHING_WENT_WRONG.to_string()
            }
        }
    }
}
