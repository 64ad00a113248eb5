// Reservations API client.
// Talks to the host's reservation list endpoint and walks it page by page.

use crate::mapper::{map_reservations, Reservation};
use crate::upstream::ReservationsPage;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::StatusCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://www.airbnb.com.br";
pub const RESERVATIONS_PATH: &str = "/api/v2/reservations";
pub const API_KEY_HEADER: &str = "x-airbnb-api-key";

// Longest response body excerpt carried in an error.
const ERROR_BODY_LIMIT: usize = 512;

/// Upper bound on pages requested in one walk.
pub const MAX_PAGES: usize = 1000;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication rejected by the API (status {status_code})")]
    Unauthorized { status_code: u16 },

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed API response: {0}")]
    DecodeError(String),

    #[error("Client error: {0}")]
    ClientError(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub cookie: String,
    pub locale: String,
    pub currency: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            cookie: cookie.into(),
            locale: "pt".to_string(),
            currency: "BRL".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn reservations_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), RESERVATIONS_PATH)
    }

    // Query string for one page of the reservation list.
    pub fn page_query(&self, offset: usize, limit: usize) -> Vec<(&'static str, String)> {
        vec![
            ("locale", self.locale.clone()),
            ("currency", self.currency.clone()),
            ("_format", "for_remy".to_string()),
            ("_limit", limit.to_string()),
            ("_offset", offset.to_string()),
            ("collection_strategy", "for_reservations_list".to_string()),
            ("sort_field", "start_date".to_string()),
            ("sort_order", "desc".to_string()),
            ("status", "accepted,request,canceled".to_string()),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientStats {
    pub pages_fetched: usize,
    pub reservations_received: usize,
    pub requests_failed: usize,
}

// Source of reservation pages. Implemented over HTTP in production and by stubs in tests.
#[async_trait]
pub trait ReservationSource: Send + Sync {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<ReservationsPage, ApiError>;

    fn stats(&self) -> ClientStats;
}

pub struct HostApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    stats: Mutex<ClientStats>,
}

impl HostApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        if config.api_key.trim().is_empty() || config.cookie.trim().is_empty() {
            return Err(ApiError::ClientError(
                "api key and cookie are required".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            header_value(&config.api_key, "api key")?,
        );
        headers.insert(COOKIE, header_value(&config.cookie, "cookie")?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::ClientError(e.to_string()))?;

        info!(base_url = %config.base_url, "API client configured");

        Ok(Self {
            http,
            config,
            stats: Mutex::new(ClientStats::default()),
        })
    }

    fn record<F: FnOnce(&mut ClientStats)>(&self, update: F) {
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut stats);
    }

    async fn request_page(&self, offset: usize, limit: usize) -> Result<ReservationsPage, ApiError> {
        let response = self
            .http
            .get(self.config.reservations_url())
            .query(&self.config.page_query(offset, limit))
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized {
                status_code: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::ApiResponseError {
                status_code: status.as_u16(),
                message: excerpt(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::DecodeError(e.to_string()))
    }
}

#[async_trait]
impl ReservationSource for HostApiClient {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<ReservationsPage, ApiError> {
        info!(offset, limit, "requesting reservations page");
        let started = Instant::now();

        let result = self.request_page(offset, limit).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(page) => {
                debug!(offset, count = page.reservations.len(), elapsed_ms, "page received");
                let count = page.reservations.len();
                self.record(|stats| {
                    stats.pages_fetched += 1;
                    stats.reservations_received += count;
                });
            }
            Err(e) => {
                error!(offset, elapsed_ms, error = %e, "failed to fetch reservations page");
                self.record(|stats| stats.requests_failed += 1);
            }
        }

        result
    }

    fn stats(&self) -> ClientStats {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Walks the reservation list from offset 0 until the API returns an empty or
/// short page.
///
/// Records are mapped page by page and returned in upstream order. The first
/// failing request aborts the walk, as does exceeding [`MAX_PAGES`].
pub async fn fetch_all(
    source: &dyn ReservationSource,
    page_size: usize,
) -> Result<Vec<Reservation>, ApiError> {
    if page_size == 0 {
        return Err(ApiError::ClientError("page size must be at least 1".to_string()));
    }

    let mut offset = 0;
    let mut reservations = Vec::new();

    for _ in 0..MAX_PAGES {
        let page = source.fetch_page(offset, page_size).await?;
        let received = page.reservations.len();
        reservations.extend(map_reservations(page.reservations));

        if received < page_size {
            info!(total = reservations.len(), "all reservations retrieved");
            return Ok(reservations);
        }
        offset += page_size;
    }

    Err(ApiError::ClientError(format!(
        "pagination did not end after {} pages; the API may be ignoring the offset",
        MAX_PAGES
    )))
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value.trim())
        .map_err(|_| ApiError::ClientError(format!("{} contains invalid header characters", what)))
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
