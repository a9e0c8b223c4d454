use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub chairmap: ChairmapConfig,
    pub monitor: MonitorConfig,
    pub store: StoreConfig,
    pub telegram: TelegramConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

// Источник схемы зала
#[derive(Debug, Clone, Deserialize)]
pub struct ChairmapConfig {
    pub url: String,
}

// Настройки мониторинга
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub default_min_seats: u32,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

// Файл с подписками
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub db_file: PathBuf,
}

// Настройки Telegram Bot API
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub api_url: String,
    pub poll_timeout_secs: u64,
}

pub const DEFAULT_CHAIRMAP_URL: &str = "https://t-hazafon.smarticket.co.il/iframe/api/chairmap";
pub const DEFAULT_DB_FILE: &str = "theater_bot_db.toml";

// Ноль здесь означает опрос без пауз или пустые группы, это ошибка конфигурации
fn positive<T>(name: &str, raw: &str) -> T
where
    T: FromStr + Default + PartialEq,
{
    let value: T = raw
        .trim()
        .parse()
        .unwrap_or_else(|_| panic!("{} must be a valid number", name));
    if value == T::default() {
        panic!("{} must be greater than zero", name);
    }
    value
}

impl Config {
    pub fn from_env() -> Self {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| {
            if env::var("IS_PRODUCTION").as_deref() == Ok("TRUE") {
                "production".to_string()
            } else {
                "development".to_string()
            }
        });

        // В проде база лежит на примонтированном томе
        let default_db_file = if environment == "production" {
            format!("/data/{}", DEFAULT_DB_FILE)
        } else {
            DEFAULT_DB_FILE.to_string()
        };

        Config {
            app: AppConfig {
                environment,
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "seat_watcher=info".to_string()),
                log_format: match env::var("LOG_FORMAT").as_deref() {
                    Ok("json") => LogFormat::Json,
                    Ok("text") | Err(_) => LogFormat::Text,
                    Ok(other) => panic!("LOG_FORMAT must be text or json, got {}", other),
                },
            },
            chairmap: ChairmapConfig {
                url: env::var("CHAIRMAP_URL").unwrap_or_else(|_| DEFAULT_CHAIRMAP_URL.to_string()),
            },
            monitor: MonitorConfig {
                interval_secs: positive(
                    "MONITORING_INTERVAL_SECS",
                    &env::var("MONITORING_INTERVAL_SECS").unwrap_or_else(|_| "300".to_string()),
                ),
                default_min_seats: positive(
                    "DEFAULT_MIN_SEATS",
                    &env::var("DEFAULT_MIN_SEATS").unwrap_or_else(|_| "2".to_string()),
                ),
            },
            store: StoreConfig {
                db_file: env::var("DB_FILE").unwrap_or(default_db_file).into(),
            },
            telegram: TelegramConfig {
                bot_token: env::var("BOT_TOKEN").ok().filter(|t| !t.is_empty()),
                api_url: env::var("TELEGRAM_API_URL")
                    .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
                poll_timeout_secs: env::var("TELEGRAM_POLL_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("TELEGRAM_POLL_TIMEOUT_SECS must be a valid number"),
            },
        }
    }
}
