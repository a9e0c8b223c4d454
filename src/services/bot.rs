use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    services::{dialogue::Dialogue, messages},
    telegram::{ReplyKeyboardMarkup, TelegramClient},
};

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Цикл long polling бота. Сообщения обрабатываются по очереди, ответ
/// всегда уходит с клавиатурой главного меню.
pub async fn run_bot(client: TelegramClient, dialogue: Arc<Dialogue>, cancel: CancellationToken) {
    let keyboard = ReplyKeyboardMarkup::from_rows(messages::MAIN_MENU);
    let mut offset = 0;

    info!("🤖 Bot started, polling for updates");

    loop {
        let updates = tokio::select! {
            _ = cancel.cancelled() => break,
            result = client.get_updates(offset) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Failed to fetch updates: {}", e);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                }
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                continue;
            };

            let chat_id = message.chat.id;
            debug!("Message from chat {}: {}", chat_id, text);

            let reply = dialogue.handle(chat_id, &text).await;
            if let Err(e) = client.send_message(chat_id, &reply, Some(&keyboard)).await {
                error!("Failed to reply to chat {}: {}", chat_id, e);
            }
        }
    }

    info!("🛑 Bot polling stopped");
}
