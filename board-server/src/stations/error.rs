//! Station directory error types.

use crate::upstream::UpstreamError;

/// Errors from the station directory and its disk cache.
#[derive(Debug, thiserror::Error)]
pub enum StationsError {
    /// Fetching the consolidated listing failed
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Disk cache operation failed
    #[error("cache error: {message}")]
    Cache { message: String },
}
