//! Board selector types.
//!
//! The selector is the navigational parameter identifying what to poll:
//! a station id, a stop-code list, or a single legacy stop code.

use std::fmt;

/// Error returned when parsing an invalid stop code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop code: {reason}")]
pub struct InvalidStopCode {
    reason: &'static str,
}

/// Error returned when parsing an invalid selector from query parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSelector {
    #[error("{0}")]
    StopCode(#[from] InvalidStopCode),

    #[error("stops parameter contains no stop codes")]
    EmptyStops,
}

/// Maximum accepted stop code length.
const MAX_STOP_CODE_LEN: usize = 32;

/// A validated agency stop code.
///
/// Stop codes are short, printable ASCII, and never contain commas or
/// whitespace (they are comma-joined in URLs). Any `StopCode` value is
/// valid by construction.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopCode(String);

impl StopCode {
    /// Parse a stop code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStopCode> {
        if s.is_empty() {
            return Err(InvalidStopCode {
                reason: "must not be empty",
            });
        }

        if s.len() > MAX_STOP_CODE_LEN {
            return Err(InvalidStopCode {
                reason: "too long",
            });
        }

        for b in s.bytes() {
            if !b.is_ascii_graphic() {
                return Err(InvalidStopCode {
                    reason: "must be printable ASCII without whitespace",
                });
            }
            if b == b',' {
                return Err(InvalidStopCode {
                    reason: "must not contain commas",
                });
            }
        }

        Ok(StopCode(s.to_string()))
    }

    /// Returns the stop code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopCode({})", self.0)
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the board should poll.
///
/// Parsed from the page's query parameters. `station` takes precedence over
/// `stops`, which takes precedence over the legacy `stopCode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// A consolidated station id (`?station=stn-...`).
    Station(String),

    /// An explicit stop-code list (`?stops=a,b,c`).
    Stops(Vec<StopCode>),

    /// A single stop code (`?stopCode=...`, backwards compatible).
    StopCode(StopCode),
}

impl Selector {
    /// Convenience constructor for a station selector.
    pub fn station(id: impl Into<String>) -> Self {
        Selector::Station(id.into())
    }

    /// Parse a selector from the three recognized query parameters.
    ///
    /// Returns `Ok(None)` when none of the parameters is present (the page
    /// shows the landing/search view and makes no network call).
    pub fn from_query(
        station: Option<&str>,
        stops: Option<&str>,
        stop_code: Option<&str>,
    ) -> Result<Option<Self>, InvalidSelector> {
        if let Some(station) = station.map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(Some(Selector::Station(station.to_string())));
        }

        if let Some(stops) = stops {
            let codes = stops
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(StopCode::parse)
                .collect::<Result<Vec<_>, _>>()?;

            if codes.is_empty() {
                return Err(InvalidSelector::EmptyStops);
            }
            return Ok(Some(Selector::Stops(codes)));
        }

        if let Some(code) = stop_code.map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(Some(Selector::StopCode(StopCode::parse(code)?)));
        }

        Ok(None)
    }

    /// The backend query parameter for this selector.
    pub fn query_pair(&self) -> (&'static str, String) {
        match self {
            Selector::Station(id) => ("station", id.clone()),
            Selector::Stops(codes) => ("stops", join_codes(codes)),
            Selector::StopCode(code) => ("stopCode", code.to_string()),
        }
    }

    /// The stop codes this selector names, if it names any directly.
    pub fn stop_codes(&self) -> Option<&[StopCode]> {
        match self {
            Selector::Station(_) => None,
            Selector::Stops(codes) => Some(codes),
            Selector::StopCode(code) => Some(std::slice::from_ref(code)),
        }
    }

    /// The station id this selector names, if any.
    pub fn station_id(&self) -> Option<&str> {
        match self {
            Selector::Station(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Selector {
    /// Canonical query-string form, e.g. `stops=1078,3629`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (key, value) = self.query_pair();
        write!(f, "{key}={value}")
    }
}

fn join_codes(codes: &[StopCode]) -> String {
    codes
        .iter()
        .map(StopCode::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_stop_codes() {
        assert!(StopCode::parse("02799").is_ok());
        assert!(StopCode::parse("AL-1078").is_ok());
        assert!(StopCode::parse("UW").is_ok());
    }

    #[test]
    fn reject_bad_stop_codes() {
        assert!(StopCode::parse("").is_err());
        assert!(StopCode::parse("a,b").is_err());
        assert!(StopCode::parse("has space").is_err());
        assert!(StopCode::parse("tab\there").is_err());
        assert!(StopCode::parse(&"x".repeat(33)).is_err());
    }

    #[test]
    fn no_params_is_no_selector() {
        assert_eq!(Selector::from_query(None, None, None).unwrap(), None);
        assert_eq!(Selector::from_query(Some(""), Some("  "), None).unwrap(), None);
    }

    #[test]
    fn station_param_wins() {
        let sel = Selector::from_query(Some("stn-02799"), Some("1078"), Some("9999"))
            .unwrap()
            .unwrap();
        assert_eq!(sel, Selector::Station("stn-02799".to_string()));
    }

    #[test]
    fn stops_param_parses_csv() {
        let sel = Selector::from_query(None, Some("1078, 3629 ,,1079"), None)
            .unwrap()
            .unwrap();
        let Selector::Stops(codes) = &sel else {
            panic!("expected stops selector");
        };
        assert_eq!(codes.len(), 3);
        assert_eq!(sel.query_pair(), ("stops", "1078,3629,1079".to_string()));
    }

    #[test]
    fn stops_param_all_empty_is_invalid() {
        assert_eq!(
            Selector::from_query(None, Some(", ,"), None),
            Err(InvalidSelector::EmptyStops)
        );
    }

    #[test]
    fn malformed_stop_in_csv_is_invalid() {
        assert!(Selector::from_query(None, Some("1078,bad code"), None).is_err());
    }

    #[test]
    fn legacy_stop_code_param() {
        let sel = Selector::from_query(None, None, Some("02799")).unwrap().unwrap();
        assert_eq!(sel.query_pair(), ("stopCode", "02799".to_string()));
        assert_eq!(sel.stop_codes().unwrap().len(), 1);
    }

    #[test]
    fn display_is_canonical_query() {
        let sel = Selector::station("stn-02799");
        assert_eq!(sel.to_string(), "station=stn-02799");
    }

    #[test]
    fn station_selector_names_no_stop_codes() {
        assert!(Selector::station("stn-02799").stop_codes().is_none());
        assert_eq!(Selector::station("stn-02799").station_id(), Some("stn-02799"));
    }
}
