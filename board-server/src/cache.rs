//! Caching layer for backend API responses.
//!
//! Several viewers of the same station share one poll: a departures snapshot
//! is cached for a few seconds keyed by selector, so N open boards produce
//! one upstream fetch per cycle instead of N. Social-preview images are
//! cached for an hour (they change rarely and the endpoint is expensive
//! upstream); search results briefly. Errors are never cached.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache as MokaCache;

use crate::board::Selector;
use crate::upstream::{
    DeparturesProvider, NetworkGroup, Station, StationSearchResponse, UpstreamClient, UpstreamError,
};

/// Configuration for the response caches.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for departures snapshots.
    pub departures_ttl: Duration,

    /// TTL for social-preview images.
    pub og_image_ttl: Duration,

    /// TTL for search results.
    pub search_ttl: Duration,

    /// Maximum number of entries per cache.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            departures_ttl: Duration::from_secs(15),
            og_image_ttl: Duration::from_secs(3600),
            search_ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

/// Upstream client with response caching.
#[derive(Clone)]
pub struct CachedUpstream {
    client: UpstreamClient,
    departures: MokaCache<Selector, Arc<Vec<NetworkGroup>>>,
    og_images: MokaCache<(String, Option<String>), Bytes>,
    searches: MokaCache<(String, usize), Arc<StationSearchResponse>>,
}

impl CachedUpstream {
    /// Create a new cached client.
    pub fn new(client: UpstreamClient, config: &CacheConfig) -> Self {
        Self {
            client,
            departures: MokaCache::builder()
                .time_to_live(config.departures_ttl)
                .max_capacity(config.max_capacity)
                .build(),
            og_images: MokaCache::builder()
                .time_to_live(config.og_image_ttl)
                .max_capacity(config.max_capacity)
                .build(),
            searches: MokaCache::builder()
                .time_to_live(config.search_ttl)
                .max_capacity(config.max_capacity)
                .build(),
        }
    }

    /// Get a departures snapshot, using the cache if available.
    pub async fn departures(
        &self,
        selector: &Selector,
    ) -> Result<Arc<Vec<NetworkGroup>>, UpstreamError> {
        if let Some(cached) = self.departures.get(selector).await {
            return Ok(cached);
        }

        let snapshot = Arc::new(self.client.departures(selector).await?);
        self.departures
            .insert(selector.clone(), snapshot.clone())
            .await;

        Ok(snapshot)
    }

    /// Search stations, using the cache if available.
    pub async fn search_stations(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Arc<StationSearchResponse>, UpstreamError> {
        let key = (query.to_string(), limit);

        if let Some(cached) = self.searches.get(&key).await {
            return Ok(cached);
        }

        let response = Arc::new(self.client.search_stations(query, limit).await?);
        self.searches.insert(key, response.clone()).await;

        Ok(response)
    }

    /// Fetch the consolidated station listing. Not cached here: the station
    /// directory holds the listing for a day and refreshes it itself.
    pub async fn consolidated_stations(&self) -> Result<Vec<Station>, UpstreamError> {
        self.client.consolidated_stations().await
    }

    /// Get a social-preview image, using the cache if available.
    pub async fn og_image(
        &self,
        selector: &Selector,
        name: Option<&str>,
    ) -> Result<Bytes, UpstreamError> {
        let key = (selector.to_string(), name.map(str::to_string));

        if let Some(cached) = self.og_images.get(&key).await {
            return Ok(cached);
        }

        let image = self.client.og_image(selector, name).await?;
        self.og_images.insert(key, image.clone()).await;

        Ok(image)
    }

    /// Access the underlying client for operations that bypass the cache.
    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }
}

impl DeparturesProvider for CachedUpstream {
    async fn departures(&self, selector: &Selector) -> Result<Vec<NetworkGroup>, UpstreamError> {
        let snapshot = CachedUpstream::departures(self, selector).await?;
        Ok((*snapshot).clone())
    }
}
