//! store.rs
//!
//! Хранилище подписок: TOML-файл плюс его копия в памяти.
//!
//! Файл перезаписывается целиком после каждого изменения. Подписок десятки,
//! поэтому инкрементальная запись не нужна. Ошибка записи логируется и не
//! прерывает вызывающую операцию: до конца жизни процесса истиной остаётся
//! память.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::models::{SeatGroup, Subscription, SubscriptionKey};

pub type Subscriptions = HashMap<SubscriptionKey, Subscription>;

#[derive(Deserialize)]
struct StoreFile {
    #[serde(default)]
    monitored_shows: Subscriptions,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    monitored_shows: BTreeMap<&'a SubscriptionKey, &'a Subscription>,
}

fn read_file(path: &Path) -> Result<Subscriptions, StoreError> {
    let raw = std::fs::read_to_string(path)?;
    let file: StoreFile = toml::from_str(&raw)?;
    Ok(file.monitored_shows)
}

/// Загружает подписки из файла.
///
/// Нет файла - пустой набор. Файл не читается или битый - он удаляется и
/// мы начинаем с нуля: прежние подписки теряются, и это пишется в лог.
pub fn load(path: &Path) -> Subscriptions {
    match read_file(path) {
        Ok(shows) => shows,
        Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => Subscriptions::new(),
        Err(e) => {
            error!("Error loading subscription store {}: {}", path.display(), e);
            warn!("🗑️ Store file is corrupted, deleting it and starting fresh");
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != ErrorKind::NotFound {
                    error!("Failed to delete corrupted store {}: {}", path.display(), e);
                }
            }
            Subscriptions::new()
        }
    }
}

/// Записывает все подписки в файл, целиком.
///
/// Пишем во временный файл рядом и переименовываем, чтобы оборванная запись
/// не оставила полфайла.
pub async fn save(path: &Path, shows: &Subscriptions) -> Result<(), StoreError> {
    let file = StoreFileRef {
        monitored_shows: shows.iter().collect(),
    };
    let data = toml::to_string(&file)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Единственный источник правды о том, что сейчас отслеживается.
pub struct SubscriptionStore {
    path: PathBuf,
    shows: RwLock<Subscriptions>,
    // Сериализует запись файла, чтобы старый снимок не перетёр новый
    write_lock: Mutex<()>,
}

impl SubscriptionStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let shows = load(&path);
        info!("📂 Loaded {} subscriptions from {}", shows.len(), path.display());
        Self {
            path,
            shows: RwLock::new(shows),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &SubscriptionKey) -> Option<Subscription> {
        self.shows.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &SubscriptionKey) -> bool {
        self.shows.read().await.contains_key(key)
    }

    pub async fn keys(&self) -> Vec<SubscriptionKey> {
        let mut keys: Vec<_> = self.shows.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn is_empty(&self) -> bool {
        self.shows.read().await.is_empty()
    }

    /// Подписки одного чата, старые первыми.
    pub async fn for_chat(&self, chat_id: i64) -> Vec<(SubscriptionKey, Subscription)> {
        let mut shows: Vec<_> = self
            .shows
            .read()
            .await
            .iter()
            .filter(|(_, sub)| sub.chat_id == chat_id)
            .map(|(key, sub)| (key.clone(), sub.clone()))
            .collect();
        shows.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then_with(|| a.0.cmp(&b.0)));
        shows
    }

    /// Добавляет (или заменяет) подписку и сохраняет файл.
    pub async fn insert(&self, subscription: Subscription) -> SubscriptionKey {
        let key = subscription.key();
        self.shows.write().await.insert(key.clone(), subscription);
        self.persist().await;
        key
    }

    pub async fn remove(&self, key: &SubscriptionKey) -> Option<Subscription> {
        let removed = self.shows.write().await.remove(key);
        if removed.is_some() {
            self.persist().await;
        }
        removed
    }

    /// Меняет максимальный ряд. `None`, если подписки уже нет.
    pub async fn set_row_ceiling(
        &self,
        key: &SubscriptionKey,
        row_ceiling: Option<u32>,
    ) -> Option<Subscription> {
        let updated = {
            let mut shows = self.shows.write().await;
            let sub = shows.get_mut(key)?;
            sub.row_ceiling = row_ceiling;
            sub.clone()
        };
        self.persist().await;
        Some(updated)
    }

    /// Запоминает результат очередной проверки. `false`, если подписку уже удалили.
    pub async fn record_groups(&self, key: &SubscriptionKey, groups: Vec<SeatGroup>) -> bool {
        {
            let mut shows = self.shows.write().await;
            match shows.get_mut(key) {
                Some(sub) => sub.last_groups = groups,
                None => return false,
            }
        }
        self.persist().await;
        true
    }

    /// Сохраняет текущее состояние. Ошибку только логируем.
    pub async fn persist(&self) {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.shows.read().await.clone();

        match save(&self.path, &snapshot).await {
            Ok(()) => debug!("Saved {} subscriptions to {}", snapshot.len(), self.path.display()),
            Err(e) => error!("Error saving subscription store {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(chat_id: i64, target: &str) -> Subscription {
        let mut sub = Subscription::new(
            chat_id,
            target,
            3,
            Some(12),
            Some(format!("https://example.com/?showURL={}", target)),
        );
        sub.last_groups = vec![
            SeatGroup::new("5", "1", "3", 3),
            SeatGroup::new("B", "10", "14", 5),
        ];
        sub
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shows.toml");

        let mut shows = Subscriptions::new();
        for sub in [sample(1, "100"), sample(2, "200"), Subscription::new(3, "300", 1, None, None)] {
            shows.insert(sub.key(), sub);
        }

        save(&path, &shows).await.unwrap();
        let loaded = load(&path);

        assert_eq!(loaded, shows);
        // count не участвует в равенстве групп, проверяем отдельно
        let key = SubscriptionKey::new(2, "200");
        assert_eq!(loaded[&key].last_groups[1].count, 5);
        assert_eq!(loaded[&SubscriptionKey::new(3, "300")].row_ceiling, None);
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        assert!(load(&dir.path().join("nope.toml")).is_empty());
    }

    #[test]
    fn corrupted_file_is_removed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shows.toml");
        std::fs::write(&path, "monitored_shows = [[[ not toml").unwrap();

        assert!(load(&path).is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn reads_existing_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("theater_bot_db.toml");
        std::fs::write(
            &path,
            r#"
[monitored_shows.123_4521]
chat_id = 123
theater_id = "4521"
min_seats = 2
created_at = "2024-03-01T18:30:00.123456"
max_row = 10

[[monitored_shows.123_4521.last_available_groups]]
row = "4"
start_chair = "7"
end_chair = "9"
count = 3

[monitored_shows.123_99]
chat_id = 123
theater_id = "99"
min_seats = 4
created_at = "2024-03-02T09:00:00"
last_available_groups = []
"#,
        )
        .unwrap();

        let shows = load(&path);

        assert_eq!(shows.len(), 2);
        let sub = &shows[&SubscriptionKey::new(123, "4521")];
        assert_eq!(sub.target_id, "4521");
        assert_eq!(sub.min_run, 2);
        assert_eq!(sub.row_ceiling, Some(10));
        assert_eq!(sub.source_url, None);
        assert_eq!(sub.last_groups, vec![SeatGroup::new("4", "7", "9", 3)]);
        assert!(shows[&SubscriptionKey::new(123, "99")].last_groups.is_empty());
    }

    #[tokio::test]
    async fn mutations_are_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shows.toml");
        let store = SubscriptionStore::open(&path);

        let key = store.insert(sample(7, "555")).await;
        assert!(store.record_groups(&key, vec![SeatGroup::new("1", "1", "2", 2)]).await);
        assert!(store.set_row_ceiling(&key, None).await.is_some());

        let reopened = load(&path);
        assert_eq!(reopened[&key].last_groups, vec![SeatGroup::new("1", "1", "2", 2)]);
        assert_eq!(reopened[&key].row_ceiling, None);

        assert!(store.remove(&key).await.is_some());
        assert!(load(&path).is_empty());
    }

    #[tokio::test]
    async fn stale_keys_are_reported() {
        let dir = tempdir().unwrap();
        let store = SubscriptionStore::open(dir.path().join("shows.toml"));
        let key = SubscriptionKey::new(1, "1");

        assert!(!store.record_groups(&key, Vec::new()).await);
        assert!(store.set_row_ceiling(&key, Some(3)).await.is_none());
        assert!(store.remove(&key).await.is_none());
    }

    #[tokio::test]
    async fn lists_only_chat_subscriptions() {
        let dir = tempdir().unwrap();
        let store = SubscriptionStore::open(dir.path().join("shows.toml"));
        store.insert(sample(1, "10")).await;
        store.insert(sample(2, "20")).await;
        store.insert(sample(1, "30")).await;

        let mine = store.for_chat(1).await;

        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|(_, sub)| sub.chat_id == 1));
    }

    #[tokio::test]
    async fn write_failures_do_not_break_operations() {
        let dir = tempdir().unwrap();
        // родительского каталога нет, любая запись файла падает
        let path = dir.path().join("missing").join("shows.toml");
        let store = SubscriptionStore::open(&path);

        let key = store.insert(sample(3, "42")).await;
        assert!(store.get(&key).await.is_some());

        assert!(store.record_groups(&key, vec![SeatGroup::new("2", "5", "6", 2)]).await);
        assert_eq!(
            store.get(&key).await.unwrap().last_groups,
            vec![SeatGroup::new("2", "5", "6", 2)]
        );

        assert_eq!(store.set_row_ceiling(&key, Some(4)).await.unwrap().row_ceiling, Some(4));
        assert!(store.remove(&key).await.is_some());
        assert!(store.is_empty().await);
        assert!(!path.exists());
        assert!(save(&path, &Subscriptions::new()).await.is_err());
    }
}
