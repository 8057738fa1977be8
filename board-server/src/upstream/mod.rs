//! Transit backend client.
//!
//! The backend computes countdowns and route colors server-side; this module
//! only fetches and type-checks its responses.

mod client;
mod error;
pub mod mock;
mod types;

pub use client::{UpstreamClient, UpstreamConfig};
pub use error::UpstreamError;
pub use types::{DepartureTime, NetworkGroup, RouteGroup, Station, StationSearchResponse, Stop};

use std::future::Future;

use crate::board::Selector;

/// Source of departure snapshots for a selector.
///
/// The seam between the board controller and the HTTP client, so the
/// controller's timing semantics can be tested against a scripted mock.
pub trait DeparturesProvider: Send + Sync {
    /// Fetch one complete snapshot for the selector.
    fn departures(
        &self,
        selector: &Selector,
    ) -> impl Future<Output = Result<Vec<NetworkGroup>, UpstreamError>> + Send;
}

impl<P: DeparturesProvider> DeparturesProvider for std::sync::Arc<P> {
    fn departures(
        &self,
        selector: &Selector,
    ) -> impl Future<Output = Result<Vec<NetworkGroup>, UpstreamError>> + Send {
        (**self).departures(selector)
    }
}

impl DeparturesProvider for UpstreamClient {
    fn departures(
        &self,
        selector: &Selector,
    ) -> impl Future<Output = Result<Vec<NetworkGroup>, UpstreamError>> + Send {
        UpstreamClient::departures(self, selector)
    }
}
