//! Consolidated station directory.
//!
//! Holds the full station listing for reverse lookup: given the stop codes a
//! board is polling, find the station whose stop set covers them and use its
//! display name. Refreshed daily in the background; a refresh failure keeps
//! the existing listing.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::board::{Selector, StopCode};
use crate::cache::CachedUpstream;
use crate::upstream::Station;

use super::cache::ListingCache;
use super::error::StationsError;

/// Shown when no station matches a selector.
pub const GENERIC_STATION_LABEL: &str = "Station";

/// Prefix stripped from station ids when deriving a readable fallback name.
pub const STATION_ID_PREFIX: &str = "stn-";

/// Thread-safe station listing with reverse lookup.
#[derive(Clone)]
pub struct StationDirectory {
    inner: Arc<RwLock<Vec<Station>>>,
    upstream: Arc<CachedUpstream>,
    disk: Option<ListingCache>,
}

impl StationDirectory {
    /// Create an empty directory.
    pub fn new(upstream: Arc<CachedUpstream>, disk: Option<ListingCache>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
            upstream,
            disk,
        }
    }

    /// Load the listing: from the disk cache if fresh, otherwise from the
    /// backend (writing the disk cache on success).
    pub async fn bootstrap(&self) -> Result<usize, StationsError> {
        if let Some(stations) = self.disk.as_ref().and_then(|d| d.load()) {
            let count = stations.len();
            *self.inner.write().await = stations;
            return Ok(count);
        }

        self.refresh().await
    }

    /// Refresh the listing from the backend.
    ///
    /// On success, replaces the current listing and rewrites the disk cache.
    /// On failure, the existing listing is preserved and the error returned.
    pub async fn refresh(&self) -> Result<usize, StationsError> {
        let stations = self.upstream.consolidated_stations().await?;
        let count = stations.len();

        if let Some(disk) = &self.disk
            && let Err(e) = disk.save(&stations)
        {
            // A dead disk cache costs a refetch at next startup, nothing more.
            tracing::warn!(error = %e, "failed to write station listing cache");
        }

        *self.inner.write().await = stations;
        Ok(count)
    }

    /// Number of stations in the listing.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the listing is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// The current listing.
    pub async fn all(&self) -> Vec<Station> {
        self.inner.read().await.clone()
    }

    /// Find a station by id.
    pub async fn find_by_id(&self, station_id: &str) -> Option<Station> {
        let guard = self.inner.read().await;
        guard.iter().find(|s| s.station_id == station_id).cloned()
    }

    /// Resolve a display name for a set of stop codes: the first station
    /// whose stop set covers all of them.
    pub async fn resolve_name(&self, codes: &[StopCode]) -> Option<String> {
        let guard = self.inner.read().await;
        resolve_station(&guard, codes).map(|s| s.station_name.clone())
    }

    /// The display name for a selector, resolved server-side so the page
    /// never flashes a placeholder.
    ///
    /// Falls back to a readable name derived from the station id, and to a
    /// generic label when nothing matches.
    pub async fn display_name(&self, selector: &Selector) -> String {
        match selector {
            Selector::Station(id) => match self.find_by_id(id).await {
                Some(station) => station.station_name,
                None => fallback_name(id),
            },
            _ => {
                let codes = selector.stop_codes().unwrap_or_default();
                match self.resolve_name(codes).await {
                    Some(name) => name,
                    None => GENERIC_STATION_LABEL.to_string(),
                }
            }
        }
    }

    /// Replace the listing (for tests and bootstrap).
    #[cfg(test)]
    async fn replace(&self, stations: Vec<Station>) {
        *self.inner.write().await = stations;
    }
}

/// The first station whose stop set is a superset of the requested codes.
pub fn resolve_station<'a>(stations: &'a [Station], codes: &[StopCode]) -> Option<&'a Station> {
    if codes.is_empty() {
        return None;
    }

    let ids: Vec<&str> = codes.iter().map(StopCode::as_str).collect();
    stations.iter().find(|s| s.covers(&ids))
}

/// Derive a readable name from a station id: strip the `stn-` prefix and
/// title-case the hyphen-separated words.
pub fn fallback_name(station_id: &str) -> String {
    let stripped = station_id.strip_prefix(STATION_ID_PREFIX).unwrap_or(station_id);

    stripped
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Fallback naming never produces an empty string for a non-empty id
        /// with at least one alphanumeric word.
        #[test]
        fn fallback_nonempty(words in proptest::collection::vec("[a-z0-9]{1,8}", 1..5)) {
            let id = format!("{STATION_ID_PREFIX}{}", words.join("-"));
            let name = fallback_name(&id);
            prop_assert!(!name.is_empty());
            prop_assert_eq!(name.split(' ').count(), words.len());
        }

        /// Every word in the fallback starts with an uppercase letter when
        /// the source word starts with a letter.
        #[test]
        fn fallback_title_cases(words in proptest::collection::vec("[a-z]{1,8}", 1..5)) {
            let id = format!("{STATION_ID_PREFIX}{}", words.join("-"));
            for word in fallback_name(&id).split(' ') {
                prop_assert!(word.chars().next().unwrap().is_uppercase());
            }
        }
    }
}
