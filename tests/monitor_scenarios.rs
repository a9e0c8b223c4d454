//! Сценарии мониторинга целиком: от HTML схемы зала до уведомления и файла
//! с подписками.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use seat_watcher::{
    chairmap_client::SeatMapSource,
    error::{FetchError, NotifyError},
    models::{SeatGroup, Subscription, SubscriptionKey},
    seatmap::{find_adjacent_groups, parse_seats},
    services::monitor::{SeatMonitor, TickOutcome},
    store::{self, SubscriptionStore},
    telegram::NotifySink,
};

/// Схема зала: для каждого ряда строка из `F` (свободно) и `T` (занято).
fn chart(rows: &[(&str, &str)]) -> String {
    let mut html = String::from("<div class=\"hall\">\n");
    for (row, pattern) in rows {
        for (i, c) in pattern.chars().enumerate() {
            let class = if c == 'T' { "chair taken" } else { "chair" };
            html.push_str(&format!(
                "  <a href=\"#\"\n     data-row=\"{}\" class=\"{}\"\n     data-chair=\"{}\">\n    <span>{}</span>\n  </a>\n",
                row,
                class,
                i + 1,
                i + 1
            ));
        }
    }
    html.push_str("</div>\n");
    html
}

struct FixedChart(String);

#[async_trait]
impl SeatMapSource for FixedChart {
    async fn fetch_seat_map(&self, _theater_id: &str) -> Result<String, FetchError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct Outbox(Mutex<Vec<(i64, String)>>);

impl Outbox {
    fn messages(&self) -> Vec<(i64, String)> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifySink for Outbox {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        self.0.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

fn monitor(store: &Arc<SubscriptionStore>, html: String, outbox: &Arc<Outbox>) -> SeatMonitor {
    SeatMonitor::new(
        store.clone(),
        Arc::new(FixedChart(html)),
        outbox.clone(),
        Duration::from_secs(300),
    )
}

#[test]
fn basic_find() {
    let seats = parse_seats(&chart(&[("5", "FFTFFF")]));

    let groups = find_adjacent_groups(&seats, 2, None);

    assert_eq!(
        groups,
        vec![SeatGroup::new("5", "1", "2", 2), SeatGroup::new("5", "4", "6", 3)]
    );
    assert_eq!(groups[0].count, 2);
    assert_eq!(groups[1].count, 3);
}

#[test]
fn row_ceiling_excludes_far_rows() {
    let seats = parse_seats(&chart(&[("3", "FFTF"), ("10", "FFF")]));

    let limited = find_adjacent_groups(&seats, 2, Some(4));
    let unlimited = find_adjacent_groups(&seats, 2, None);

    assert_eq!(limited, vec![SeatGroup::new("3", "1", "2", 2)]);
    assert_eq!(
        unlimited,
        vec![SeatGroup::new("3", "1", "2", 2), SeatGroup::new("10", "1", "3", 3)]
    );
}

#[tokio::test]
async fn unchanged_availability_notifies_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("theater_bot_db.toml");
    let store = Arc::new(SubscriptionStore::open(&path));
    let key = store.insert(Subscription::new(100, "4521", 2, None, None)).await;
    let outbox = Arc::new(Outbox::default());
    let monitor = monitor(&store, chart(&[("5", "FFTFFF")]), &outbox);
    let cancel = CancellationToken::new();

    monitor.tick(&key, &cancel).await;
    let after_first = store.get(&key).await.unwrap().last_groups;
    assert_eq!(outbox.messages().len(), 1);

    // файл должен переписываться на каждой проверке
    std::fs::remove_file(&path).unwrap();
    let outcome = monitor.tick(&key, &cancel).await;

    assert_eq!(
        outcome,
        TickOutcome::Checked { total_groups: 2, new_groups: 0, notified: false }
    );
    assert_eq!(outbox.messages().len(), 1);
    assert_eq!(store.get(&key).await.unwrap().last_groups, after_first);
    assert!(path.exists());
    assert_eq!(store::load(&path)[&key].last_groups, after_first);
}

#[tokio::test]
async fn restart_resumes_without_renotifying() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("theater_bot_db.toml");
    let html = chart(&[("1", "FFFT"), ("2", "TFF")]);
    let key = SubscriptionKey::new(7, "900");

    {
        let store = Arc::new(SubscriptionStore::open(&path));
        store
            .insert(Subscription::new(7, "900", 2, Some(5), Some("https://x/?showURL=900".into())))
            .await;
        let outbox = Arc::new(Outbox::default());
        monitor(&store, html.clone(), &outbox)
            .tick(&key, &CancellationToken::new())
            .await;
        assert_eq!(outbox.messages().len(), 1);
        assert!(outbox.messages()[0].1.contains("🔗 https://x/?showURL=900"));
    }

    // "перезапуск": новое хранилище читает тот же файл
    let store = Arc::new(SubscriptionStore::open(&path));
    let restored = store.get(&key).await.unwrap();
    assert_eq!(restored.row_ceiling, Some(5));
    assert_eq!(
        restored.last_groups,
        vec![SeatGroup::new("1", "1", "3", 3), SeatGroup::new("2", "2", "3", 2)]
    );

    let outbox = Arc::new(Outbox::default());
    let outcome = monitor(&store, html, &outbox)
        .tick(&key, &CancellationToken::new())
        .await;

    assert_eq!(
        outcome,
        TickOutcome::Checked { total_groups: 2, new_groups: 0, notified: false }
    );
    assert!(outbox.messages().is_empty());
}

#[tokio::test]
async fn seats_freed_after_restart_are_announced() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shows.toml");
    let key = SubscriptionKey::new(1, "55");

    {
        let store = Arc::new(SubscriptionStore::open(&path));
        store.insert(Subscription::new(1, "55", 2, None, None)).await;
        let outbox = Arc::new(Outbox::default());
        monitor(&store, chart(&[("4", "FFTTTT")]), &outbox)
            .tick(&key, &CancellationToken::new())
            .await;
    }

    let store = Arc::new(SubscriptionStore::open(&path));
    let outbox = Arc::new(Outbox::default());
    monitor(&store, chart(&[("4", "FFTTFF")]), &outbox)
        .tick(&key, &CancellationToken::new())
        .await;

    let messages = outbox.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0].1,
        "🎉 New available seats found for show 55!\n\
         1. 2 adjacent seats: Row 4, Chair 5 - 6\n\
         \nTotal available groups: 2"
    );
}
