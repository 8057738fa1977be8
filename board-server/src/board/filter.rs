//! Snapshot filtering and view preparation.
//!
//! Pure transformation from a raw poll snapshot to the render-ready board:
//! stale departures are hidden, emptied groups pruned, and at most two
//! departures shown per route row. The countdown values themselves come from
//! the backend; nothing here recomputes them.

use serde::Serialize;

use crate::upstream::{NetworkGroup, RouteGroup};

/// Departures older than this many minutes are hidden. The one-minute
/// negative tolerance absorbs clock skew between client and server.
pub const STALE_COUNTDOWN_MIN: f64 = -1.0;

/// A first departure at or below this countdown is labeled "Due" instead of
/// a number.
pub const DUE_THRESHOLD_MIN: f64 = 0.0;

/// The "min" unit label is shown only when a displayed countdown is within
/// this many minutes (120 seconds).
pub const MINUTES_LABEL_THRESHOLD_MIN: f64 = 2.0;

/// At most this many departures are displayed per route row.
pub const MAX_DISPLAYED_DEPARTURES: usize = 2;

/// One displayed departure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureView {
    /// Scheduled time text from the backend.
    pub time: String,

    /// Countdown text: "Due" or whole minutes.
    pub label: String,

    /// Whether this departure is imminent or already boarding.
    pub due: bool,

    /// Rendered in the subordinate style (every displayed departure after
    /// the first).
    pub subordinate: bool,
}

/// One route+direction row on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRow {
    pub route_number: String,
    pub branch_code: String,
    pub headsign: String,
    pub platform: String,
    pub route_color: String,
    pub route_text_color: String,

    /// Whether to render the "min" unit label on this row.
    pub show_minutes: bool,

    /// One or two departures, soonest first.
    pub departures: Vec<DepartureView>,
}

/// One network's rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkView {
    pub network: String,
    pub rows: Vec<RouteRow>,
}

/// The render-ready board.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardView {
    pub networks: Vec<NetworkView>,
}

impl BoardView {
    /// Whether nothing is left to show after filtering.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

/// Transform a raw snapshot into the render-ready board.
///
/// Route groups whose departures are all stale vanish; networks whose route
/// groups all vanish are omitted entirely.
pub fn prepare_board(snapshot: &[NetworkGroup]) -> BoardView {
    let networks = snapshot
        .iter()
        .filter_map(|group| {
            let rows: Vec<RouteRow> = group.route_groups.iter().filter_map(prepare_row).collect();

            if rows.is_empty() {
                None
            } else {
                Some(NetworkView {
                    network: group.network.clone(),
                    rows,
                })
            }
        })
        .collect();

    BoardView { networks }
}

/// Prepare one route row, or `None` if every departure is stale.
fn prepare_row(group: &RouteGroup) -> Option<RouteRow> {
    let remaining: Vec<_> = group
        .departures
        .iter()
        .filter(|d| d.countdown >= STALE_COUNTDOWN_MIN)
        .take(MAX_DISPLAYED_DEPARTURES)
        .collect();

    if remaining.is_empty() {
        return None;
    }

    let show_minutes = remaining
        .iter()
        .any(|d| d.countdown <= MINUTES_LABEL_THRESHOLD_MIN);

    let departures = remaining
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let due = i == 0 && d.countdown <= DUE_THRESHOLD_MIN;
            DepartureView {
                time: d.time.clone(),
                label: if due {
                    "Due".to_string()
                } else {
                    format!("{}", d.countdown.round() as i64)
                },
                due,
                subordinate: i > 0,
            }
        })
        .collect();

    Some(RouteRow {
        route_number: group.route_number.clone(),
        branch_code: group.branch_code.clone(),
        headsign: group.headsign.clone(),
        platform: group.platform.clone(),
        route_color: group.route_color.clone(),
        route_text_color: group.route_text_color.clone(),
        show_minutes,
        departures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::mock::{network_group, route_group};

    #[test]
    fn stale_departures_are_filtered() {
        // -5 is stale, 3 survives
        let snapshot = vec![network_group(
            "GRT",
            vec![route_group("301", "Forest Glen", &[-5.0, 3.0])],
        )];

        let board = prepare_board(&snapshot);
        let row = &board.networks[0].rows[0];
        assert_eq!(row.departures.len(), 1);
        assert_eq!(row.departures[0].label, "3");
        assert!(!row.departures[0].due);
    }

    #[test]
    fn tolerance_keeps_minus_one() {
        let snapshot = vec![network_group(
            "GRT",
            vec![route_group("301", "Forest Glen", &[-1.0, -1.1])],
        )];

        let board = prepare_board(&snapshot);
        let row = &board.networks[0].rows[0];
        assert_eq!(row.departures.len(), 1);
        assert!(row.departures[0].due);
    }

    #[test]
    fn emptied_route_group_is_dropped() {
        let snapshot = vec![network_group(
            "GRT",
            vec![
                route_group("301", "Forest Glen", &[-4.0, -2.0]),
                route_group("302", "UW", &[6.0]),
            ],
        )];

        let board = prepare_board(&snapshot);
        assert_eq!(board.networks[0].rows.len(), 1);
        assert_eq!(board.networks[0].rows[0].route_number, "302");
    }

    #[test]
    fn emptied_network_is_omitted() {
        let snapshot = vec![
            network_group("GRT", vec![route_group("301", "Forest Glen", &[-9.0])]),
            network_group("GO", vec![route_group("30", "Kitchener", &[12.0])]),
        ];

        let board = prepare_board(&snapshot);
        assert_eq!(board.networks.len(), 1);
        assert_eq!(board.networks[0].network, "GO");
    }

    #[test]
    fn at_most_two_departures_displayed() {
        let snapshot = vec![network_group(
            "GRT",
            vec![route_group("301", "Forest Glen", &[1.0, 5.0, 9.0, 14.0])],
        )];

        let board = prepare_board(&snapshot);
        let row = &board.networks[0].rows[0];
        assert_eq!(row.departures.len(), 2);
        assert!(!row.departures[0].subordinate);
        assert!(row.departures[1].subordinate);
    }

    #[test]
    fn first_departure_due_iff_countdown_at_most_zero() {
        let snapshot = vec![network_group(
            "GRT",
            vec![
                route_group("301", "Forest Glen", &[0.0, 8.0]),
                route_group("302", "UW", &[0.4, 8.0]),
            ],
        )];

        let board = prepare_board(&snapshot);
        let rows = &board.networks[0].rows;
        assert!(rows[0].departures[0].due);
        assert_eq!(rows[0].departures[0].label, "Due");
        assert!(!rows[1].departures[0].due);
    }

    #[test]
    fn minutes_label_suppressed_when_all_far_out() {
        let near = vec![network_group(
            "GRT",
            vec![route_group("301", "Forest Glen", &[2.0, 15.0])],
        )];
        let far = vec![network_group(
            "GRT",
            vec![route_group("301", "Forest Glen", &[7.0, 15.0])],
        )];

        assert!(prepare_board(&near).networks[0].rows[0].show_minutes);
        assert!(!prepare_board(&far).networks[0].rows[0].show_minutes);
    }

    #[test]
    fn fractional_countdowns_round_for_display() {
        let snapshot = vec![network_group(
            "GRT",
            vec![route_group("301", "Forest Glen", &[3.6])],
        )];

        let board = prepare_board(&snapshot);
        assert_eq!(board.networks[0].rows[0].departures[0].label, "4");
    }

    #[test]
    fn all_stale_board_is_empty() {
        let snapshot = vec![network_group(
            "GRT",
            vec![route_group("301", "Forest Glen", &[-3.0])],
        )];

        assert!(prepare_board(&snapshot).is_empty());
        assert!(prepare_board(&[]).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::upstream::mock::{network_group, route_group};
    use proptest::prelude::*;

    fn countdowns() -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(-30.0f64..120.0, 0..8)
    }

    proptest! {
        /// Exactly the countdowns >= -1 survive, capped at two per row.
        #[test]
        fn filter_drops_exactly_the_stale(cds in countdowns()) {
            let snapshot = vec![network_group("GRT", vec![route_group("301", "X", &cds)])];
            let board = prepare_board(&snapshot);

            let surviving = cds.iter().filter(|&&c| c >= STALE_COUNTDOWN_MIN).count();
            if surviving == 0 {
                prop_assert!(board.is_empty());
            } else {
                let row = &board.networks[0].rows[0];
                prop_assert_eq!(row.departures.len(), surviving.min(MAX_DISPLAYED_DEPARTURES));
            }
        }

        /// Only the first displayed departure can be labeled Due.
        #[test]
        fn due_only_on_first(cds in countdowns()) {
            let snapshot = vec![network_group("GRT", vec![route_group("301", "X", &cds)])];
            let board = prepare_board(&snapshot);

            for network in &board.networks {
                for row in &network.rows {
                    for d in row.departures.iter().skip(1) {
                        prop_assert!(!d.due);
                        prop_assert!(d.subordinate);
                    }
                }
            }
        }

        /// Every displayed row kept at least one departure.
        #[test]
        fn no_empty_rows(cds in countdowns()) {
            let snapshot = vec![network_group("GRT", vec![route_group("301", "X", &cds)])];
            for network in &prepare_board(&snapshot).networks {
                prop_assert!(!network.rows.is_empty());
                for row in &network.rows {
                    prop_assert!(!row.departures.is_empty());
                }
            }
        }
    }
}
