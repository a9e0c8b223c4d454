use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    chairmap_client::SeatMapSource,
    error::AppError,
    models::{SeatGroup, Subscription, SubscriptionKey},
    seatmap::{find_adjacent_groups, parse_seats},
    services::monitor::MonitorScheduler,
    store::SubscriptionStore,
};

/// Результат разовой проверки спектакля.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindResult {
    pub seats_total: usize,
    pub seats_available: usize,
    pub groups: Vec<SeatGroup>,
}

/// Операции над подписками для диалогового слоя.
///
/// Хранилище и планировщик меняются только отсюда, поэтому запись в файл и
/// запуск/остановка задачи всегда идут парой.
pub struct SubscriptionService {
    store: Arc<SubscriptionStore>,
    scheduler: Arc<MonitorScheduler>,
    source: Arc<dyn SeatMapSource>,
    default_min_seats: u32,
}

impl SubscriptionService {
    pub fn new(
        store: Arc<SubscriptionStore>,
        scheduler: Arc<MonitorScheduler>,
        source: Arc<dyn SeatMapSource>,
        default_min_seats: u32,
    ) -> Self {
        Self {
            store,
            scheduler,
            source,
            default_min_seats,
        }
    }

    pub fn store(&self) -> &Arc<SubscriptionStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &Arc<MonitorScheduler> {
        &self.scheduler
    }

    /// Создаёт подписку и запускает её мониторинг. Повторная подписка на тот
    /// же спектакль из того же чата заменяет прежнюю.
    pub async fn create_subscription(
        &self,
        chat_id: i64,
        target_id: &str,
        min_run: u32,
        row_ceiling: Option<u32>,
        source_url: Option<String>,
    ) -> Result<Subscription, AppError> {
        let target_id = target_id.trim();
        if target_id.is_empty() {
            return Err(AppError::Validation("show id must not be empty".to_string()));
        }
        if min_run < 1 {
            return Err(AppError::Validation("minimum number of seats must be at least 1".to_string()));
        }
        if row_ceiling == Some(0) {
            return Err(AppError::Validation("maximum row must be positive".to_string()));
        }

        let subscription = Subscription::new(chat_id, target_id, min_run, row_ceiling, source_url);

        // Старая задача может дописать свои группы; она должна завершиться
        // до того, как в хранилище появится новая запись
        let key = subscription.key();
        if self.scheduler.stop(&key).await {
            debug!("Stopped previous monitoring for {}", key);
        }
        self.store.insert(subscription.clone()).await;
        self.scheduler.start(key).await;

        info!(
            "➕ Chat {} subscribed to show {} (min {}, max row {:?})",
            chat_id, target_id, min_run, row_ceiling
        );
        Ok(subscription)
    }

    /// Меняет максимальный ряд. Задача не перезапускается: значение
    /// подхватится на следующей проверке.
    pub async fn update_row_ceiling(
        &self,
        key: &SubscriptionKey,
        row_ceiling: Option<u32>,
    ) -> Result<Subscription, AppError> {
        if row_ceiling == Some(0) {
            return Err(AppError::Validation("maximum row must be positive".to_string()));
        }

        let updated = self
            .store
            .set_row_ceiling(key, row_ceiling)
            .await
            .ok_or_else(|| AppError::NotFound(key.clone()))?;

        info!("✏️ Max row for {} set to {:?}", key, row_ceiling);
        Ok(updated)
    }

    /// Удаляет подписку и останавливает её задачу.
    pub async fn delete_subscription(&self, key: &SubscriptionKey) -> Result<Subscription, AppError> {
        let removed = self
            .store
            .remove(key)
            .await
            .ok_or_else(|| AppError::NotFound(key.clone()))?;

        if !self.scheduler.stop(key).await {
            debug!("No running task for {}", key);
        }

        info!("➖ Subscription {} removed", key);
        Ok(removed)
    }

    pub async fn list_subscriptions(&self, chat_id: i64) -> Vec<(SubscriptionKey, Subscription)> {
        self.store.for_chat(chat_id).await
    }

    /// Разовая проверка без подписки: загрузить, разобрать, сгруппировать
    /// с минимумом по умолчанию и без ограничения ряда.
    pub async fn find_now(&self, target_id: &str) -> Result<FindResult, AppError> {
        let document = self.source.fetch_seat_map(target_id).await?;
        let seats = parse_seats(&document);
        let seats_available = seats.iter().filter(|seat| !seat.occupied).count();

        debug!(
            "Show {}: {} seats total, {} available",
            target_id,
            seats.len(),
            seats_available
        );

        let groups = find_adjacent_groups(&seats, self.default_min_seats, None);
        Ok(FindResult {
            seats_total: seats.len(),
            seats_available,
            groups,
        })
    }

    /// Запускает мониторинг всех сохранённых подписок.
    pub async fn resume_all(&self) -> usize {
        let keys = self.store.keys().await;
        for key in &keys {
            self.scheduler.start(key.clone()).await;
        }
        if keys.is_empty() {
            warn!("No saved subscriptions to resume");
        } else {
            info!("🔄 Resumed monitoring for {} subscriptions", keys.len());
        }
        keys.len()
    }

    pub async fn shutdown(&self) {
        self.scheduler.stop_all().await;
    }
}
