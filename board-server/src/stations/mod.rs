//! Station directory, listing cache, and autocomplete search.

pub mod cache;
pub mod directory;
pub mod error;
pub mod search;

pub use cache::{ListingCache, ListingCacheConfig};
pub use directory::{
    fallback_name, resolve_station, StationDirectory, GENERIC_STATION_LABEL, STATION_ID_PREFIX,
};
pub use error::StationsError;
pub use search::{
    navigation_target, Key, SearchAction, SearchBox, SearchSession, Selection, StationSearcher,
    DEBOUNCE, MIN_QUERY_LEN, RESULT_LIMIT,
};
