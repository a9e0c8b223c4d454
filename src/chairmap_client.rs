use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use crate::{config::ChairmapConfig, error::FetchError};

/// Источник HTML-схемы зала для спектакля.
#[async_trait]
pub trait SeatMapSource: Send + Sync {
    async fn fetch_seat_map(&self, theater_id: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Serialize)]
struct ChairmapRequest<'a> {
    show_theater: &'a str,
}

/// Клиент для эндпоинта `chairmap` сайта продажи билетов.
#[derive(Clone)]
pub struct ChairmapClient {
    url: String,
    http_client: reqwest::Client,
}

impl ChairmapClient {
    // Таймаут не ставим: зависший запрос тормозит только одну подписку
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        Ok(Self {
            url: url.into(),
            http_client: reqwest::Client::builder().build()?,
        })
    }

    pub fn from_config(config: &ChairmapConfig) -> Result<Self, FetchError> {
        Self::new(config.url.clone())
    }
}

#[async_trait]
impl SeatMapSource for ChairmapClient {
    async fn fetch_seat_map(&self, theater_id: &str) -> Result<String, FetchError> {
        debug!("Fetching chairmap for theater {}", theater_id);

        let response = self
            .http_client
            .post(&self.url)
            .form(&ChairmapRequest { show_theater: theater_id })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Chairmap request for theater {} failed with {}", theater_id, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_theater_id_as_form() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iframe/api/chairmap"))
            .and(body_string("show_theater=4521"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a class=\"chair\"></a>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ChairmapClient::new(format!("{}/iframe/api/chairmap", mock_server.uri())).unwrap();
        let body = client.fetch_seat_map("4521").await.unwrap();

        assert_eq!(body, "<a class=\"chair\"></a>");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = ChairmapClient::new(mock_server.uri()).unwrap();
        let err = client.fetch_seat_map("1").await.unwrap_err();

        assert!(matches!(err, FetchError::Status(503)));
    }
}
