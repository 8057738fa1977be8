//! Station autocomplete.
//!
//! Split into a pure state machine ([`SearchBox`]) and an async driver
//! ([`SearchSession`]) that owns the debounce timer and the request token.
//! The token is a monotonic counter: every keystroke and every selection
//! invalidates all earlier pending work, so an out-of-order response can
//! never overwrite newer state.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::board::{Selector, StopCode};
use crate::upstream::{Station, StationSearchResponse, UpstreamError};

/// Minimum query length before a search is issued.
pub const MIN_QUERY_LEN: usize = 2;

/// Debounce window: a keystroke resets this timer; only the last pending
/// timer issues a request.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Maximum number of candidates requested.
pub const RESULT_LIMIT: usize = 8;

/// Source of station search results.
pub trait StationSearcher: Send + Sync {
    /// Search stations by free text.
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<StationSearchResponse, UpstreamError>> + Send;
}

impl<S: StationSearcher> StationSearcher for Arc<S> {
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<StationSearchResponse, UpstreamError>> + Send {
        (**self).search(query, limit)
    }
}

impl StationSearcher for crate::upstream::UpstreamClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<StationSearchResponse, UpstreamError> {
        self.search_stations(query, limit).await
    }
}

impl StationSearcher for crate::cache::CachedUpstream {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<StationSearchResponse, UpstreamError> {
        self.search_stations(query, limit)
            .await
            .map(|r| (*r).clone())
    }
}

/// Keyboard input the search box understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// What the host should do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    /// Nothing to do.
    None,

    /// Arm (or re-arm) the debounce timer for this query.
    Debounce(String),

    /// Cancel any pending debounce timer.
    CancelDebounce,

    /// The user committed this station.
    Select(Station),
}

/// Pure autocomplete state machine.
///
/// Owns its query string, result list, and highlighted-index cursor; shares
/// nothing with the board beyond the selector produced on selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchBox {
    query: String,
    results: Vec<Station>,
    dropdown_open: bool,
    /// Cursor in `[-1, results.len() - 1]`; -1 means nothing highlighted.
    highlighted: isize,
    loading: bool,
}

impl SearchBox {
    /// Create an idle search box.
    pub fn new() -> Self {
        Self {
            highlighted: -1,
            ..Self::default()
        }
    }

    /// The committed query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current candidate list (may be retained while hidden).
    pub fn results(&self) -> &[Station] {
        &self.results
    }

    /// Whether the dropdown is visible.
    pub fn is_open(&self) -> bool {
        self.dropdown_open && !self.results.is_empty()
    }

    /// The highlighted index, or -1.
    pub fn highlighted(&self) -> isize {
        self.highlighted
    }

    /// Whether a search request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// A keystroke changed the input text.
    pub fn input(&mut self, text: &str) -> SearchAction {
        self.query = text.to_string();

        if self.query.trim().len() < MIN_QUERY_LEN {
            self.results.clear();
            self.dropdown_open = false;
            self.highlighted = -1;
            self.loading = false;
            return SearchAction::CancelDebounce;
        }

        SearchAction::Debounce(self.query.clone())
    }

    /// The debounce timer fired and a request is going out.
    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Results arrived for `for_query`.
    ///
    /// Ignored unless `for_query` is still the committed query; a response
    /// that outlived its input must not overwrite newer state.
    pub fn apply_results(&mut self, for_query: &str, stations: Vec<Station>) {
        if for_query != self.query {
            return;
        }

        self.loading = false;
        self.dropdown_open = !stations.is_empty();
        self.results = stations;
        self.highlighted = -1;
    }

    /// The search request failed: empty the dropdown, never surface an
    /// error.
    pub fn search_failed(&mut self) {
        self.loading = false;
        self.results.clear();
        self.dropdown_open = false;
        self.highlighted = -1;
    }

    /// Keyboard navigation.
    pub fn key(&mut self, key: Key) -> SearchAction {
        if !self.is_open() {
            return SearchAction::None;
        }

        match key {
            Key::ArrowDown => {
                self.highlighted = (self.highlighted + 1).min(self.results.len() as isize - 1);
                SearchAction::None
            }
            Key::ArrowUp => {
                self.highlighted = (self.highlighted - 1).max(-1);
                SearchAction::None
            }
            Key::Enter => {
                if self.highlighted >= 0 && (self.highlighted as usize) < self.results.len() {
                    self.select(self.highlighted as usize)
                } else {
                    SearchAction::None
                }
            }
            Key::Escape => {
                self.dropdown_open = false;
                self.highlighted = -1;
                SearchAction::None
            }
        }
    }

    /// Pointer click (or Enter) on the candidate at `index`.
    pub fn select(&mut self, index: usize) -> SearchAction {
        let Some(station) = self.results.get(index).cloned() else {
            return SearchAction::None;
        };

        self.query = station.station_name.clone();
        self.dropdown_open = false;
        self.highlighted = -1;
        self.loading = false;

        SearchAction::Select(station)
    }

    /// Focus or pointer activity outside the component.
    pub fn click_outside(&mut self) {
        self.dropdown_open = false;
        self.highlighted = -1;
        // Results are retained, only hidden.
    }

    /// The input regained focus: re-open retained results.
    pub fn focus(&mut self) {
        if self.query.len() >= MIN_QUERY_LEN && !self.results.is_empty() {
            self.dropdown_open = true;
        }
    }
}

/// The navigation target for a selected station: its non-empty stop codes,
/// comma-joined into a stops selector. `None` when the station has no usable
/// stop codes (no navigation happens).
pub fn navigation_target(station: &Station) -> Option<Selector> {
    let codes: Vec<StopCode> = station
        .stop_ids()
        .filter_map(|id| StopCode::parse(id).ok())
        .collect();

    if codes.is_empty() {
        None
    } else {
        Some(Selector::Stops(codes))
    }
}

/// Committed selection, as reported by [`SearchSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The chosen station.
    pub station: Station,

    /// Where to navigate, if the station has usable stop codes.
    pub selector: Option<Selector>,
}

struct SessionInner {
    state: SearchBox,
    /// Monotonic request token; pending work with an older token is stale.
    token: u64,
}

/// Async driver for the search box: debounce, request issue, token guard.
pub struct SearchSession<S: StationSearcher> {
    searcher: Arc<S>,
    inner: Arc<Mutex<SessionInner>>,
}

impl<S: StationSearcher + 'static> SearchSession<S> {
    /// Create a session over the given searcher.
    pub fn new(searcher: S) -> Self {
        Self {
            searcher: Arc::new(searcher),
            inner: Arc::new(Mutex::new(SessionInner {
                state: SearchBox::new(),
                token: 0,
            })),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SearchBox {
        self.inner.lock().unwrap().state.clone()
    }

    /// A keystroke changed the input text. Re-arms the debounce timer;
    /// whatever was pending becomes stale.
    pub fn input(&self, text: &str) {
        let (action, token) = {
            let mut inner = self.inner.lock().unwrap();
            // Every keystroke invalidates earlier debounces and in-flight
            // requests.
            inner.token += 1;
            (inner.state.input(text), inner.token)
        };

        let SearchAction::Debounce(query) = action else {
            return;
        };

        let searcher = self.searcher.clone();
        let shared = self.inner.clone();

        tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE).await;

            {
                let mut inner = shared.lock().unwrap();
                if inner.token != token {
                    // A newer keystroke superseded this debounce.
                    return;
                }
                inner.state.begin_loading();
            }

            let result = searcher.search(&query, RESULT_LIMIT).await;

            let mut inner = shared.lock().unwrap();
            if inner.token != token {
                // Out-of-order response: newer state exists, drop it.
                return;
            }

            match result {
                Ok(response) => inner.state.apply_results(&query, response.stations),
                Err(e) => {
                    tracing::debug!(query = %query, error = %e, "station search failed");
                    inner.state.search_failed();
                }
            }
        });
    }

    /// Keyboard navigation. Returns the committed selection, if any.
    pub fn key(&self, key: Key) -> Option<Selection> {
        let mut inner = self.inner.lock().unwrap();
        let action = inner.state.key(key);
        Self::finish(&mut inner, action)
    }

    /// Pointer click on the candidate at `index`.
    pub fn click(&self, index: usize) -> Option<Selection> {
        let mut inner = self.inner.lock().unwrap();
        let action = inner.state.select(index);
        Self::finish(&mut inner, action)
    }

    /// Focus/blur plumbing.
    pub fn focus(&self) {
        self.inner.lock().unwrap().state.focus();
    }

    /// Pointer activity outside the component.
    pub fn click_outside(&self) {
        self.inner.lock().unwrap().state.click_outside();
    }

    fn finish(inner: &mut SessionInner, action: SearchAction) -> Option<Selection> {
        let SearchAction::Select(station) = action else {
            return None;
        };

        // A committed selection also invalidates any pending search: the
        // query was just rewritten to the station name and must not be
        // clobbered by a late response.
        inner.token += 1;

        Some(Selection {
            selector: navigation_target(&station),
            station,
        })
    }
}
