//! Application state for the web layer.

use std::sync::Arc;

use chrono_tz::Tz;

use crate::cache::CachedUpstream;
use crate::stations::StationDirectory;

/// Deployment settings that handlers consult per request.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Time zone for the board clock.
    pub timezone: Tz,

    /// Whether the origin allowlist is enforced on `/api` routes.
    pub production: bool,

    /// Origins allowed to call `/api` routes in production.
    pub allowed_origins: Vec<String>,
}

impl Settings {
    /// Development settings: no origin enforcement.
    pub fn development(timezone: Tz) -> Self {
        Self {
            timezone,
            production: false,
            allowed_origins: Vec::new(),
        }
    }

    /// Production settings with the given origin allowlist.
    pub fn production(timezone: Tz, allowed_origins: Vec<String>) -> Self {
        Self {
            timezone,
            production: true,
            allowed_origins,
        }
    }
}

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Caching client for the departures backend
    pub upstream: Arc<CachedUpstream>,

    /// In-memory station listing, refreshed daily
    pub directory: StationDirectory,

    /// Deployment settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(upstream: Arc<CachedUpstream>, directory: StationDirectory, settings: Settings) -> Self {
        Self {
            upstream,
            directory,
            settings: Arc::new(settings),
        }
    }
}
