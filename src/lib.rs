pub mod chairmap_client;
pub mod config;
pub mod error;
pub mod models;
pub mod seatmap;
pub mod services;
pub mod store;
pub mod telegram;

use std::sync::Arc;

use crate::{
    chairmap_client::SeatMapSource,
    services::{
        dialogue::Dialogue,
        monitor::{MonitorScheduler, SeatMonitor},
        subscriptions::SubscriptionService,
    },
    store::SubscriptionStore,
    telegram::NotifySink,
};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub store: Arc<SubscriptionStore>,
    pub scheduler: Arc<MonitorScheduler>,
    pub subscriptions: Arc<SubscriptionService>,
    pub dialogue: Arc<Dialogue>,
}

impl AppState {
    /// Собирает хранилище, планировщик и сервисы. Источник схемы и канал
    /// уведомлений передаются снаружи, чтобы в тестах подставлять моки.
    pub fn new(
        config: config::Config,
        source: Arc<dyn SeatMapSource>,
        sink: Arc<dyn NotifySink>,
    ) -> Arc<Self> {
        let store = Arc::new(SubscriptionStore::open(&config.store.db_file));

        let monitor = Arc::new(SeatMonitor::new(
            store.clone(),
            source.clone(),
            sink,
            config.monitor.interval(),
        ));
        let scheduler = Arc::new(MonitorScheduler::new(monitor));

        let subscriptions = Arc::new(SubscriptionService::new(
            store.clone(),
            scheduler.clone(),
            source,
            config.monitor.default_min_seats,
        ));
        let dialogue = Arc::new(Dialogue::new(subscriptions.clone()));

        Arc::new(Self {
            config,
            store,
            scheduler,
            subscriptions,
            dialogue,
        })
    }
}
