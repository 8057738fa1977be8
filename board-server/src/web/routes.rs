//! HTTP route handlers.

use std::convert::Infallible;

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use tower_http::services::ServeDir;

use crate::board::{BoardClock, BoardConfig, BoardHandle, BoardState, format_clock};
use crate::stations::{MIN_QUERY_LEN, RESULT_LIMIT};
use crate::upstream::{StationSearchResponse, UpstreamError};

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/board/events", get(board_events))
        .route("/api/departures", get(api_departures))
        .route("/api/stations", get(api_stations))
        .route("/api/consolidated-stations", get(api_consolidated_stations))
        .route("/api/og-image", get(api_og_image))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Landing page, or the board page when the query names a stop set.
async fn index_page(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Result<Response, AppError> {
    let Some(selector) = query.selector()? else {
        let html = IndexTemplate
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e));
        return Ok(Html(html).into_response());
    };

    let station_name = state.directory.display_name(&selector).await;
    let (key, value) = selector.query_pair();

    // Render the first snapshot server-side so the page never opens on a
    // blank board; the event stream takes over from there.
    let fragment = match state.upstream.departures(&selector).await {
        Ok(snapshot) => {
            let board = crate::board::prepare_board(&snapshot);
            BoardStateTemplate {
                loading: false,
                unavailable: false,
                networks: board.networks,
            }
        }
        Err(e) => {
            eprintln!("[board] initial fetch failed for {selector}: {e}");
            BoardStateTemplate {
                loading: false,
                unavailable: true,
                networks: Vec::new(),
            }
        }
    };

    let template = BoardTemplate {
        station_name,
        selector_query: format!("{key}={value}"),
        clock: format_clock(Utc::now(), state.settings.timezone),
        loading: fragment.loading,
        unavailable: fragment.unavailable,
        networks: fragment.networks,
    };
    let html = template.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })?;

    Ok(Html(html).into_response())
}

/// Render a board snapshot as an event stream payload.
fn board_event(state: &BoardState) -> Event {
    let html = BoardStateTemplate::from_phase(&state.phase)
        .render()
        .unwrap_or_else(|e| format!("Template error: {}", e));

    Event::default().event("board").data(html)
}

/// Live update stream for one board: `board` events carry the re-rendered
/// contents fragment, `clock` events carry the current time text.
///
/// The poll controller and the clock live exactly as long as this stream;
/// dropping it (client disconnect) aborts both tasks, so no fetch issued for
/// a closed connection can ever be observed.
async fn board_events(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let selector = query.selector()?;

    let handle = BoardHandle::spawn(state.upstream.clone(), selector, BoardConfig::default());
    let clock = BoardClock::spawn(state.settings.timezone);

    let initial = stream::iter(vec![
        board_event(&handle.state()),
        Event::default().event("clock").data(clock.current()),
    ]);

    let board_stream = stream::unfold(
        (handle.subscribe(), handle),
        |(mut rx, handle)| async move {
            rx.changed().await.ok()?;
            let snapshot = rx.borrow_and_update().clone();
            Some((board_event(&snapshot), (rx, handle)))
        },
    );

    let clock_stream = stream::unfold(
        (clock.subscribe(), clock),
        |(mut rx, clock)| async move {
            rx.changed().await.ok()?;
            let time = rx.borrow_and_update().clone();
            Some((Event::default().event("clock").data(time), (rx, clock)))
        },
    );

    let events = initial
        .chain(stream::select(board_stream, clock_stream))
        .map(Ok);

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Proxy a departures request to the backend.
///
/// The backend API key never reaches the browser; this route injects it and
/// forwards the stop selection untouched.
async fn api_departures(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BoardQuery>,
) -> Result<Response, AppError> {
    check_origin(&state, &headers)?;

    let selector = query.selector()?.ok_or_else(|| AppError::BadRequest {
        message: "missing station, stops, or stopCode parameter".to_string(),
    })?;

    let snapshot = state.upstream.departures(&selector).await?;
    Ok(Json(&*snapshot).into_response())
}

/// Search stations by name.
async fn api_stations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(req): Query<StationSearchRequest>,
) -> Result<Response, AppError> {
    check_origin(&state, &headers)?;

    let query = req.q.trim();
    if query.len() < MIN_QUERY_LEN {
        return Ok(Json(StationSearchResponse {
            query: query.to_string(),
            total_results: 0,
            stations: Vec::new(),
        })
        .into_response());
    }

    let limit = req.limit.unwrap_or(RESULT_LIMIT).min(50);
    let results = state.upstream.search_stations(query, limit).await?;
    Ok(Json(&*results).into_response())
}

/// Serve the consolidated station listing from the in-memory directory.
async fn api_consolidated_stations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    check_origin(&state, &headers)?;

    let stations = state.directory.all().await;
    Ok(Json(stations).into_response())
}

/// Proxy the share-image endpoint, with long-lived caching headers.
async fn api_og_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OgImageQuery>,
) -> Result<Response, AppError> {
    check_origin(&state, &headers)?;

    let selector = query.selector()?.ok_or_else(|| AppError::BadRequest {
        message: "missing station, stops, or stopCode parameter".to_string(),
    })?;

    let image = state
        .upstream
        .og_image(&selector, query.name.as_deref())
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        image,
    )
        .into_response())
}

/// Enforce the origin allowlist on `/api` routes in production.
///
/// Browsers send `Origin` on cross-origin requests and `Referer` on
/// same-origin ones; either is accepted when it matches the allowlist.
fn check_origin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if !state.settings.production {
        return Ok(());
    }

    let source = headers
        .get(header::ORIGIN)
        .or_else(|| headers.get(header::REFERER))
        .and_then(|v| v.to_str().ok());

    match source {
        Some(value)
            if state
                .settings
                .allowed_origins
                .iter()
                .any(|origin| value.starts_with(origin.as_str())) =>
        {
            Ok(())
        }
        _ => Err(AppError::Forbidden),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Forbidden,
    Internal { message: String },
    Upstream(UpstreamError),
}

impl From<UpstreamError> for AppError {
    fn from(e: UpstreamError) -> Self {
        AppError::Upstream(e)
    }
}

impl From<crate::board::InvalidSelector> for AppError {
    fn from(e: crate::board::InvalidSelector) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::Internal { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            }
            AppError::Upstream(e) => {
                // Backend failure detail stays server-side; clients get a
                // generic message.
                eprintln!("[upstream] {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch data".to_string(),
                )
            }
        };

        // Log errors to stderr for debugging
        eprintln!("[{status}] {message}");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
