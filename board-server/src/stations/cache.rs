//! Disk cache for the consolidated station listing.
//!
//! The listing changes roughly never; caching it lets the server restart
//! without hitting the backend, and start at all when the backend is briefly
//! down.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::upstream::Station;

use super::error::StationsError;

/// Default cache TTL: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// On-disk envelope: the listing plus when it was written.
#[derive(Debug, Serialize, Deserialize)]
struct CachedListing {
    cached_at: DateTime<Utc>,
    stations: Vec<Station>,
}

/// Configuration for the listing disk cache.
#[derive(Debug, Clone)]
pub struct ListingCacheConfig {
    /// Path to the cache file.
    pub path: PathBuf,
    /// How long a written listing stays usable.
    pub ttl: Duration,
}

impl ListingCacheConfig {
    /// Config with the given path and the default 24-hour TTL.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Disk cache for the station listing.
#[derive(Debug, Clone)]
pub struct ListingCache {
    config: ListingCacheConfig,
}

impl ListingCache {
    pub fn new(config: ListingCacheConfig) -> Self {
        Self { config }
    }

    /// Load the listing, or `None` when the file is missing, unreadable,
    /// corrupt, or past its TTL. A best-effort read: any problem just means
    /// the listing is fetched from the network instead.
    pub fn load(&self) -> Option<Vec<Station>> {
        let contents = std::fs::read_to_string(&self.config.path).ok()?;
        let cached: CachedListing = serde_json::from_str(&contents).ok()?;

        let ttl = chrono::Duration::from_std(self.config.ttl).ok()?;
        if Utc::now().signed_duration_since(cached.cached_at) >= ttl {
            return None;
        }

        Some(cached.stations)
    }

    /// Write the listing, creating parent directories as needed.
    pub fn save(&self, stations: &[Station]) -> Result<(), StationsError> {
        let envelope = CachedListing {
            cached_at: Utc::now(),
            stations: stations.to_vec(),
        };

        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StationsError::Cache {
                message: format!("creating {}: {e}", parent.display()),
            })?;
        }

        let json = serde_json::to_string(&envelope).map_err(|e| StationsError::Cache {
            message: format!("encoding listing: {e}"),
        })?;

        std::fs::write(&self.config.path, json).map_err(|e| StationsError::Cache {
            message: format!("writing {}: {e}", self.config.path.display()),
        })
    }

    /// The cache file path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::Stop;
    use tempfile::tempdir;

    fn sample_stations() -> Vec<Station> {
        vec![Station {
            station_id: "stn-waterloo-public-square".into(),
            station_name: "Waterloo Public Square".into(),
            lat: 43.465,
            lon: -80.522,
            stops: vec![Stop {
                agency: "GRT".into(),
                stop_id: "1078".into(),
                stop_name: "Waterloo Public Square Station".into(),
            }],
        }]
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempdir().unwrap();
        let cache = ListingCache::new(ListingCacheConfig::new(dir.path().join("stations.json")));

        cache.save(&sample_stations()).unwrap();

        let loaded = cache.load().expect("fresh cache should load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].station_id, "stn-waterloo-public-square");
        assert_eq!(loaded[0].stops[0].stop_id, "1078");
    }

    #[test]
    fn expired_listing_is_not_loaded() {
        let dir = tempdir().unwrap();
        let config =
            ListingCacheConfig::new(dir.path().join("stations.json")).with_ttl(Duration::ZERO);
        let cache = ListingCache::new(config);

        cache.save(&sample_stations()).unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let cache = ListingCache::new(ListingCacheConfig::new("/nonexistent/path/stations.json"));
        assert!(cache.load().is_none());
    }

    #[test]
    fn corrupt_file_is_not_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stations.json");
        std::fs::write(&path, "not json").unwrap();

        let cache = ListingCache::new(ListingCacheConfig::new(&path));
        assert!(cache.load().is_none());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("stations.json");
        let cache = ListingCache::new(ListingCacheConfig::new(&path));

        cache.save(&sample_stations()).unwrap();
        assert!(path.exists());
    }
}
