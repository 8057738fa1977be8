//! Wire types for the transit backend API.
//!
//! These are the explicit schemas at the trust boundary: every payload the
//! backend sends is parsed into one of these before anything else touches it.
//! Malformed JSON becomes a typed [`UpstreamError::Json`](super::UpstreamError),
//! never a missing field at render time.

use serde::{Deserialize, Serialize};

/// A single boarding point within a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Operating agency name (e.g. "GRT", "GO Transit").
    pub agency: String,

    /// Agency-scoped stop code. Globally unique across agencies.
    pub stop_id: String,

    /// Human-readable stop name.
    pub stop_name: String,
}

/// A consolidated station: one named place covering one or more stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Stable station identifier (e.g. "stn-waterloo-public-square").
    pub station_id: String,

    /// Display name.
    pub station_name: String,

    /// Latitude in decimal degrees.
    pub lat: f64,

    /// Longitude in decimal degrees.
    pub lon: f64,

    /// The station's stops. Non-empty for any station the backend returns.
    pub stops: Vec<Stop>,
}

impl Station {
    /// Whether this station's stop set covers every one of the given stop ids.
    pub fn covers(&self, stop_ids: &[&str]) -> bool {
        stop_ids
            .iter()
            .all(|id| self.stops.iter().any(|s| s.stop_id == *id))
    }

    /// The station's non-empty stop ids, in listing order.
    pub fn stop_ids(&self) -> impl Iterator<Item = &str> {
        self.stops
            .iter()
            .map(|s| s.stop_id.as_str())
            .filter(|id| !id.trim().is_empty())
    }
}

/// One upcoming departure within a route group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartureTime {
    /// Scheduled time text as the backend formatted it (e.g. "14:32").
    pub time: String,

    /// Minutes until departure, computed server-side. Signed: zero or
    /// negative means imminent or already departed. May be fractional when
    /// the backend normalizes seconds to minutes.
    pub countdown: f64,
}

/// One route+direction at one platform, with its upcoming departures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteGroup {
    /// Route number as displayed (e.g. "301").
    pub route_number: String,

    /// Optional branch suffix appended to the route number (e.g. "A").
    #[serde(default)]
    pub branch_code: String,

    /// Destination text.
    pub headsign: String,

    /// Platform label.
    pub platform: String,

    /// Route badge background color (CSS color).
    pub route_color: String,

    /// Route badge text color (CSS color).
    pub route_text_color: String,

    /// Owning network name (e.g. "GRT").
    pub route_network: String,

    /// Stop code this group's departures originate from.
    pub stop_code: String,

    /// Upcoming departures, soonest first.
    pub departures: Vec<DepartureTime>,
}

/// One transit network's route groups, as returned per poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkGroup {
    /// Network name.
    pub network: String,

    /// Route groups in backend order.
    pub route_groups: Vec<RouteGroup>,
}

/// Envelope for `GET /api/stations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSearchResponse {
    /// The query the backend answered (echoed back).
    pub query: String,

    /// Total matches before the limit was applied.
    pub total_results: usize,

    /// Ranked, bounded candidate list.
    pub stations: Vec<Station>,
}
