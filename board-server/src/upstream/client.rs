//! Transit backend HTTP client.
//!
//! Async methods for the departures, station search, consolidated listing,
//! and social-preview image endpoints. Handles API key injection and status
//! mapping; response bodies are parsed into the typed schemas in
//! [`types`](super::types).

use bytes::Bytes;

use crate::board::Selector;

use super::error::UpstreamError;
use super::types::{NetworkGroup, Station, StationSearchResponse};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the upstream client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// API key sent in the `X-API-Key` header
    pub api_key: String,
    /// Base URL of the transit backend
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// Create a new config with the given base URL and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Client for the transit backend API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    /// Create a new upstream client with the given configuration.
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut headers = reqwest::header::HeaderMap::new();

        let api_key = reqwest::header::HeaderValue::from_str(&config.api_key).map_err(|_| {
            UpstreamError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            }
        })?;
        headers.insert("X-API-Key", api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Get grouped departures for a selector.
    ///
    /// The selector is serialized to the backend's query parameter form
    /// (`station`, `stops` csv, or legacy `stopCode`).
    pub async fn departures(&self, selector: &Selector) -> Result<Vec<NetworkGroup>, UpstreamError> {
        let url = format!("{}/api/departures", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[selector.query_pair()])
            .send()
            .await?;

        let body = check_status(response).await?;

        serde_json::from_str(&body).map_err(|e| UpstreamError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    /// Search stations by free text.
    pub async fn search_stations(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<StationSearchResponse, UpstreamError> {
        let url = format!("{}/api/stations", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("q", query.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;

        let body = check_status(response).await?;

        serde_json::from_str(&body).map_err(|e| UpstreamError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    /// Fetch the full consolidated station listing (for reverse lookup).
    pub async fn consolidated_stations(&self) -> Result<Vec<Station>, UpstreamError> {
        let url = format!("{}/api/consolidated-stations", self.base_url);

        let response = self.http.get(&url).send().await?;
        let body = check_status(response).await?;

        serde_json::from_str(&body).map_err(|e| UpstreamError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    /// Fetch the social-preview PNG for a selector.
    pub async fn og_image(
        &self,
        selector: &Selector,
        name: Option<&str>,
    ) -> Result<Bytes, UpstreamError> {
        let url = format!("{}/api/og-image", self.base_url);

        let mut query = vec![selector.query_pair()];
        if let Some(name) = name {
            query.push(("name", name.to_string()));
        }

        let response = self.http.get(&url).query(&query).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(UpstreamError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Map a response's status to an error, or return the body text.
async fn check_status(response: reqwest::Response) -> Result<String, UpstreamError> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(UpstreamError::Unauthorized);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(UpstreamError::RateLimited);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = UpstreamConfig::new("http://localhost:8080", "test-key").with_timeout(60);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = UpstreamConfig::new("http://localhost:8080", "test-key");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn client_creation() {
        let config = UpstreamConfig::new("http://localhost:8080", "test-key");
        assert!(UpstreamClient::new(config).is_ok());
    }

    #[test]
    fn client_rejects_unprintable_api_key() {
        let config = UpstreamConfig::new("http://localhost:8080", "bad\nkey");
        assert!(UpstreamClient::new(config).is_err());
    }
}
