//! Askama templates for the web frontend.

use askama::Template;

use crate::board::{BoardPhase, NetworkView};

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Landing page with the station search box.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate;

/// Full board page for a selected stop set.
#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    /// Resolved station name shown in the header.
    pub station_name: String,

    /// Query string (without the leading '?') identifying the stop set,
    /// re-used by the event stream URL.
    pub selector_query: String,

    /// Clock text at render time.
    pub clock: String,

    pub loading: bool,
    pub unavailable: bool,
    pub networks: Vec<NetworkView>,
}

// ============================================================================
// Fragment Templates (event stream payloads, no base.html)
// ============================================================================

/// Board contents fragment. Rendered standalone for each update pushed over
/// the event stream, and included by `board.html` for the initial page.
#[derive(Template)]
#[template(path = "board_state.html")]
pub struct BoardStateTemplate {
    pub loading: bool,
    pub unavailable: bool,
    pub networks: Vec<NetworkView>,
}

impl BoardStateTemplate {
    /// Project a controller phase into the fragment's fields.
    pub fn from_phase(phase: &BoardPhase) -> Self {
        match phase {
            BoardPhase::Idle | BoardPhase::Loading => Self {
                loading: true,
                unavailable: false,
                networks: Vec::new(),
            },
            BoardPhase::Unavailable => Self {
                loading: false,
                unavailable: true,
                networks: Vec::new(),
            },
            BoardPhase::Ready { board, .. } => Self {
                loading: false,
                unavailable: false,
                networks: board.networks.clone(),
            },
        }
    }
}
