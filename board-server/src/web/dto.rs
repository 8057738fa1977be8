//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::board::{InvalidSelector, Selector};

/// Query parameters that select which stop set a board shows.
///
/// `station` wins over `stops`, which wins over `stopCode`, matching the
/// precedence the backend applies.
#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    /// Consolidated station id (e.g. "stn-waterloo-public-square")
    pub station: Option<String>,

    /// Comma-separated stop codes
    pub stops: Option<String>,

    /// Single stop code
    #[serde(rename = "stopCode")]
    pub stop_code: Option<String>,
}

impl BoardQuery {
    /// The selector these parameters describe, if any.
    pub fn selector(&self) -> Result<Option<Selector>, InvalidSelector> {
        Selector::from_query(
            self.station.as_deref(),
            self.stops.as_deref(),
            self.stop_code.as_deref(),
        )
    }
}

/// Request to search stations by free text.
#[derive(Debug, Deserialize)]
pub struct StationSearchRequest {
    /// Query text
    pub q: String,

    /// Maximum number of results (clamped server-side)
    pub limit: Option<usize>,
}

/// Query parameters for the share-image proxy.
#[derive(Debug, Deserialize)]
pub struct OgImageQuery {
    pub station: Option<String>,

    pub stops: Option<String>,

    #[serde(rename = "stopCode")]
    pub stop_code: Option<String>,

    /// Station name to render on the image
    pub name: Option<String>,
}

impl OgImageQuery {
    /// The selector these parameters describe, if any.
    pub fn selector(&self) -> Result<Option<Selector>, InvalidSelector> {
        Selector::from_query(
            self.station.as_deref(),
            self.stops.as_deref(),
            self.stop_code.as_deref(),
        )
    }
}

/// Error payload returned by `/api` routes.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
