//! Live transit departure board server.
//!
//! Proxies a departures backend (keeping its API key server-side), keeps a
//! station directory in memory, and serves departure boards that refresh
//! themselves over a server-sent event stream.

pub mod board;
pub mod cache;
pub mod stations;
pub mod upstream;
pub mod web;
