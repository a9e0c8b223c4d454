//! monitor.rs
//!
//! Фоновый мониторинг мест: по одной долгоживущей задаче на подписку.
//!
//! Ключевые компоненты:
//! 1.  **SeatMonitor**: одна проверка (tick) подписки. Загрузка схемы, разбор,
//!     поиск групп, сравнение с прошлым результатом, уведомление и запись в
//!     хранилище. Плюс сам цикл опроса с прерываемым ожиданием.
//! 2.  **MonitorScheduler**: реестр запущенных задач. Не больше одной задачи
//!     на ключ; повторный запуск сначала останавливает и дожидается прежней.

use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    chairmap_client::SeatMapSource,
    models::SubscriptionKey,
    seatmap::{find_adjacent_groups, new_groups, parse_seats},
    services::messages::Notification,
    store::SubscriptionStore,
    telegram::NotifySink,
};

/// Результат одной проверки подписки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Подписки больше нет в хранилище, цикл должен завершиться.
    Gone,
    /// Пришёл сигнал остановки во время загрузки схемы.
    Cancelled,
    /// Схема не загрузилась или в ней нет ни одного места.
    /// Прошлый результат не трогаем, иначе следующий успешный опрос
    /// повторно уведомит обо всех группах.
    NoData,
    /// Схема обработана, результат сохранён.
    Checked {
        total_groups: usize,
        new_groups: usize,
        notified: bool,
    },
}

/// Выполняет проверки подписок и крутит цикл опроса.
pub struct SeatMonitor {
    store: Arc<SubscriptionStore>,
    source: Arc<dyn SeatMapSource>,
    sink: Arc<dyn NotifySink>,
    interval: Duration,
}

impl SeatMonitor {
    pub fn new(
        store: Arc<SubscriptionStore>,
        source: Arc<dyn SeatMapSource>,
        sink: Arc<dyn NotifySink>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            source,
            sink,
            interval,
        }
    }

    /// Одна проверка подписки.
    ///
    /// Настройки (`min_run`, `row_ceiling`) читаются из хранилища на каждой
    /// проверке, так что правка максимального ряда применяется со следующего
    /// опроса без перезапуска задачи.
    pub async fn tick(&self, key: &SubscriptionKey, cancel: &CancellationToken) -> TickOutcome {
        let Some(subscription) = self.store.get(key).await else {
            return TickOutcome::Gone;
        };

        // Загрузка - единственный долгий шаг, блокировки здесь не держим
        let fetched = tokio::select! {
            _ = cancel.cancelled() => return TickOutcome::Cancelled,
            result = self.source.fetch_seat_map(&subscription.target_id) => result,
        };

        let seats = match fetched {
            Ok(document) => parse_seats(&document),
            Err(e) => {
                warn!("🌐 Failed to fetch chairmap for show {}: {}", subscription.target_id, e);
                Vec::new()
            }
        };

        if seats.is_empty() {
            debug!("No seats parsed for show {}, keeping previous result", subscription.target_id);
            return TickOutcome::NoData;
        }

        let groups = find_adjacent_groups(&seats, subscription.min_run, subscription.row_ceiling);
        let fresh = new_groups(&subscription.last_groups, &groups);

        debug!(
            "Show {}: {} seats, {} groups, {} new",
            subscription.target_id,
            seats.len(),
            groups.len(),
            fresh.len()
        );

        let mut notified = false;
        let fresh_count = fresh.len();
        let total_groups = groups.len();

        if !fresh.is_empty() {
            let notification = Notification {
                theater_id: subscription.target_id.clone(),
                new_groups: fresh,
                total_groups,
                source_url: subscription.source_url.clone(),
            };

            match self.sink.notify(subscription.chat_id, &notification.render()).await {
                Ok(()) => {
                    notified = true;
                    info!(
                        "🔔 Notification sent to chat {} for show {}",
                        subscription.chat_id, subscription.target_id
                    );
                }
                Err(e) => error!(
                    "Error sending notification to chat {}: {}",
                    subscription.chat_id, e
                ),
            }
        }

        // Перезаписываем всегда, даже если нового ничего нет
        if !self.store.record_groups(key, groups).await {
            return TickOutcome::Gone;
        }

        TickOutcome::Checked {
            total_groups,
            new_groups: fresh_count,
            notified,
        }
    }

    /// Цикл опроса одной подписки. Завершается, когда подписку удалили или
    /// пришёл сигнал остановки.
    pub async fn run(self: Arc<Self>, key: SubscriptionKey, cancel: CancellationToken) {
        info!("👀 Started monitoring {} (every {:?})", key, self.interval);

        loop {
            if cancel.is_cancelled() {
                break;
            }

            // Паника внутри проверки не должна молча гасить мониторинг
            match AssertUnwindSafe(self.tick(&key, &cancel)).catch_unwind().await {
                Ok(TickOutcome::Gone) => {
                    info!("Subscription {} no longer exists", key);
                    break;
                }
                Ok(TickOutcome::Cancelled) => break,
                Ok(outcome) => debug!("Tick for {} finished: {:?}", key, outcome),
                Err(_) => error!("💥 Monitoring tick for {} panicked, continuing", key),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("🛑 Monitoring task for {} stopped", key);
    }
}

struct MonitorTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl MonitorTask {
    async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                error!("Monitoring task panicked during shutdown: {}", e);
            }
        }
    }
}

/// Реестр задач мониторинга.
///
/// Общий реестр блокируется только на вставку/удаление записи. Ожидание
/// остановки старой задачи идёт под блокировкой своего ключа, поэтому
/// другие подписки в это время не ждут.
pub struct MonitorScheduler {
    monitor: Arc<SeatMonitor>,
    tasks: Mutex<HashMap<SubscriptionKey, MonitorTask>>,
    key_locks: Mutex<HashMap<SubscriptionKey, Arc<Mutex<()>>>>,
}

impl MonitorScheduler {
    pub fn new(monitor: Arc<SeatMonitor>) -> Self {
        Self {
            monitor,
            tasks: Mutex::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn key_lock(&self, key: &SubscriptionKey) -> Arc<Mutex<()>> {
        self.key_locks
            .lock()
            .await
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Запускает задачу для ключа. Если она уже есть, старая останавливается
    /// и мы дожидаемся её завершения до запуска новой.
    pub async fn start(&self, key: SubscriptionKey) {
        let key_lock = self.key_lock(&key).await;
        let _serial = key_lock.lock().await;

        let previous = self.tasks.lock().await.remove(&key);
        if let Some(previous) = previous {
            debug!("Replacing monitoring task for {}", key);
            previous.shutdown().await;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(self.monitor.clone().run(key.clone(), cancel.clone()));
        self.tasks
            .lock()
            .await
            .insert(key, MonitorTask { cancel, handle });
    }

    /// Останавливает задачу и дожидается её. `false`, если задачи не было.
    pub async fn stop(&self, key: &SubscriptionKey) -> bool {
        let key_lock = self.key_lock(key).await;
        let _serial = key_lock.lock().await;

        let task = self.tasks.lock().await.remove(key);
        match task {
            Some(task) => {
                task.shutdown().await;
                true
            }
            None => false,
        }
    }

    pub async fn stop_all(&self) {
        let tasks: Vec<_> = self.tasks.lock().await.drain().collect();
        info!("Stopping {} monitoring tasks", tasks.len());
        futures::future::join_all(tasks.into_iter().map(|(_, task)| task.shutdown())).await;
    }

    pub async fn is_running(&self, key: &SubscriptionKey) -> bool {
        self.tasks
            .lock()
            .await
            .get(key)
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Ключи с живыми задачами.
    pub async fn running(&self) -> Vec<SubscriptionKey> {
        let mut keys: Vec<_> = self
            .tasks
            .lock()
            .await
            .iter()
            .filter(|(_, task)| !task.handle.is_finished())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
