//! HTTP hazard feed adapter.
//!
//! Fetches hazards from the road-reporting backend:
//!
//! ```text
//! GET {base_url}/hazards/nearby?lat=<lat>&lng=<lon>&radius=<metres>
//! Authorization: Bearer <token>        (optional, issued elsewhere)
//! ```
//!
//! The body is a JSON array of reports (or an object wrapping one under
//! `hazards`). Each report carries an `id` (string or number), a `type` and a
//! location.

use std::time::Duration;

use serde::Deserialize;

use super::{FetchError, Hazard, HazardCategory, HazardId, HazardRepository};
use crate::position::Position;
use crate::BoxFuture;

/// Default request timeout for hazard fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`HttpHazardRepository`].
#[derive(Debug, Clone)]
pub struct HttpRepositoryConfig {
    /// Backend base URL, without trailing slash.
    pub base_url: String,
    /// Pre-issued bearer token, if the feed requires one.
    pub auth_token: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpRepositoryConfig {
    /// Create a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Attach a bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn nearby_url(&self) -> String {
        format!("{}/hazards/nearby", self.base_url)
    }
}

/// Hazard repository backed by the HTTP feed.
pub struct HttpHazardRepository {
    client: reqwest::Client,
    config: HttpRepositoryConfig,
}

impl HttpHazardRepository {
    /// Create a repository with its own HTTP client.
    pub fn new(config: HttpRepositoryConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn fetch(&self, center: Position, radius_m: f64) -> Result<Vec<Hazard>, FetchError> {
        let mut request = self.client.get(self.config.nearby_url()).query(&[
            ("lat", center.latitude),
            ("lng", center.longitude),
            ("radius", radius_m),
        ]);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("Failed to read response: {}", e)))?;

        decode_feed(&body)
    }
}

impl HazardRepository for HttpHazardRepository {
    fn fetch_nearby(
        &self,
        center: Position,
        radius_m: f64,
    ) -> BoxFuture<'_, Result<Vec<Hazard>, FetchError>> {
        Box::pin(self.fetch(center, radius_m))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedId {
    Text(String),
    Number(i64),
}

#[derive(Debug, Deserialize)]
struct FeedReport {
    id: FeedId,
    #[serde(rename = "type")]
    report_type: String,
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedBody {
    List(Vec<FeedReport>),
    Wrapped { hazards: Vec<FeedReport> },
}

/// Decode a hazard feed response body.
pub fn decode_feed(body: &[u8]) -> Result<Vec<Hazard>, FetchError> {
    let body: FeedBody =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let reports = match body {
        FeedBody::List(reports) => reports,
        FeedBody::Wrapped { hazards } => hazards,
    };

    Ok(reports
        .into_iter()
        .map(|r| {
            let id = match r.id {
                FeedId::Text(s) => HazardId::new(s),
                FeedId::Number(n) => HazardId::new(n.to_string()),
            };
            Hazard {
                id,
                category: HazardCategory::from_report_type(&r.report_type),
                latitude: r.latitude,
                longitude: r.longitude,
            }
        })
        .collect())
}
