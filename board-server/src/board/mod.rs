//! The departure board: selector parsing, snapshot filtering, the poll
//! controller, and the independent wall clock.

pub mod clock;
pub mod controller;
pub mod filter;
mod selector;

pub use clock::{format_clock, BoardClock};
pub use controller::{BoardConfig, BoardHandle, BoardPhase, BoardState};
pub use filter::{prepare_board, BoardView, DepartureView, NetworkView, RouteRow};
pub use selector::{InvalidSelector, InvalidStopCode, Selector, StopCode};
