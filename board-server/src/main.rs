use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use board_server::cache::{CacheConfig, CachedUpstream};
use board_server::stations::{ListingCache, ListingCacheConfig, StationDirectory};
use board_server::upstream::{UpstreamClient, UpstreamConfig};
use board_server::web::{AppState, Settings, create_router};

/// How often to refresh the station listing (24 hours).
const STATION_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const DEFAULT_TIMEZONE: &str = "America/Toronto";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "board_server=info".into()),
        )
        .init();

    // The backend URL and API key are required; without them every proxied
    // request would fail, so refuse to start.
    let backend_url =
        std::env::var("BOARD_BACKEND_URL").expect("BOARD_BACKEND_URL must be set");
    let api_key = std::env::var("BOARD_API_KEY").expect("BOARD_API_KEY must be set");

    let timezone: Tz = std::env::var("BOARD_TIMEZONE")
        .unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string())
        .parse()
        .expect("BOARD_TIMEZONE is not a valid IANA time zone");

    let production = std::env::var("BOARD_ENV").is_ok_and(|v| v == "production");
    let allowed_origins: Vec<String> = std::env::var("BOARD_ALLOWED_ORIGINS")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    if production && allowed_origins.is_empty() {
        eprintln!("Warning: BOARD_ENV=production but BOARD_ALLOWED_ORIGINS is empty; all /api requests will be rejected.");
    }

    let settings = if production {
        Settings::production(timezone, allowed_origins)
    } else {
        Settings::development(timezone)
    };

    // Create the backend client and its cache layer
    let client = UpstreamClient::new(UpstreamConfig::new(&backend_url, &api_key))
        .expect("Failed to create backend client");
    let upstream = std::sync::Arc::new(CachedUpstream::new(client, &CacheConfig::default()));

    // Optional on-disk station listing cache, for restarts while the
    // backend is unreachable
    let listing_cache = std::env::var("BOARD_STATION_CACHE")
        .ok()
        .map(|path| ListingCache::new(ListingCacheConfig::new(PathBuf::from(path))));

    // Load the station listing (fail fast if unavailable)
    println!("Loading station listing...");
    let directory = StationDirectory::new(upstream.clone(), listing_cache);
    let count = directory
        .bootstrap()
        .await
        .expect("Failed to load station listing");
    println!("Loaded {} stations", count);

    // Spawn background task to refresh the listing daily
    let directory_refresh = directory.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATION_REFRESH_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match directory_refresh.refresh().await {
                Ok(count) => println!("Refreshed station listing: {} stations", count),
                Err(e) => eprintln!("Failed to refresh station listing: {}", e),
            }
        }
    });

    // Build app state
    let state = AppState::new(upstream, directory, settings);

    let static_dir = std::env::var("BOARD_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
    let app = create_router(state, &static_dir);

    // Bind and serve
    let addr: SocketAddr = std::env::var("BOARD_BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()
        .expect("BOARD_BIND_ADDR is not a valid socket address");

    println!("Departure board listening on http://{addr}");
    println!();
    println!("Open http://{addr} in your browser for the board.");
    println!();
    println!("API Endpoints:");
    println!("  GET /health                    - Health check");
    println!("  GET /api/departures            - Departures for a stop set");
    println!("  GET /api/stations              - Station search");
    println!("  GET /api/consolidated-stations - Full station listing");
    println!("  GET /api/og-image              - Share image");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
