//! Web layer: router, handlers, templates, and DTOs.

pub mod dto;
pub mod routes;
pub mod state;
pub mod templates;

pub use routes::create_router;
pub use state::{AppState, Settings};
