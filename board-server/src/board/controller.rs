//! The departure board poll controller.
//!
//! Owns the recurring poll cycle for one board: on every selector change the
//! running cycle is cancelled (the in-flight fetch is dropped with it), an
//! immediate fetch is issued, and a fresh 30-second interval is armed. A
//! response from cycle N can therefore never land after cycle N+1 has
//! started; the per-cycle generation makes that observable.
//!
//! The wall clock is deliberately not here; see [`clock`](super::clock).

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::upstream::DeparturesProvider;

use super::filter::{prepare_board, BoardView};
use super::selector::Selector;

/// Default time between automatic refreshes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Time between automatic refreshes.
    pub poll_interval: Duration,
}

impl BoardConfig {
    /// Set a custom poll interval (for testing).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// What the board should currently show.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardPhase {
    /// No selector: show the landing/search view.
    Idle,

    /// First fetch for the current selector is in flight. Shown only once
    /// per selector so automatic refreshes never flicker back to a spinner.
    Loading,

    /// First fetch for the current selector failed and there is no snapshot
    /// to fall back on: show the generic fetch-failure state.
    Unavailable,

    /// A snapshot is available.
    Ready {
        /// Filtered, render-ready board.
        board: BoardView,

        /// When this snapshot was applied.
        refreshed_at: DateTime<Utc>,
    },
}

/// Controller output: the current phase, tagged with its selector cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    /// Monotonic selector-cycle counter. Increments every time the selector
    /// changes (including to and from "none").
    pub generation: u64,

    /// What to show.
    pub phase: BoardPhase,
}

impl BoardState {
    fn idle(generation: u64) -> Self {
        Self {
            generation,
            phase: BoardPhase::Idle,
        }
    }

    /// The current board, if one is ready.
    pub fn board(&self) -> Option<&BoardView> {
        match &self.phase {
            BoardPhase::Ready { board, .. } => Some(board),
            _ => None,
        }
    }
}

/// Handle to a running board controller task.
///
/// Selector changes go in through [`set_selector`](Self::set_selector);
/// state snapshots come out through [`subscribe`](Self::subscribe). Dropping
/// the handle aborts the task and every timer it owns.
pub struct BoardHandle {
    selector_tx: watch::Sender<Option<Selector>>,
    state_rx: watch::Receiver<BoardState>,
    task: JoinHandle<()>,
}

impl BoardHandle {
    /// Spawn a controller polling `provider`, starting from `selector`.
    pub fn spawn<P>(provider: P, selector: Option<Selector>, config: BoardConfig) -> Self
    where
        P: DeparturesProvider + 'static,
    {
        let (selector_tx, selector_rx) = watch::channel(selector);
        let (state_tx, state_rx) = watch::channel(BoardState::idle(0));

        let task = tokio::spawn(run(provider, selector_rx, state_tx, config));

        Self {
            selector_tx,
            state_rx,
            task,
        }
    }

    /// Change the selector. A no-op when the value is unchanged; otherwise
    /// the running poll cycle is cancelled and a new one starts immediately.
    pub fn set_selector(&self, selector: Option<Selector>) {
        self.selector_tx.send_if_modified(|current| {
            if *current == selector {
                false
            } else {
                *current = selector;
                true
            }
        });
    }

    /// The current state.
    pub fn state(&self) -> BoardState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.state_rx.clone()
    }
}

impl Drop for BoardHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Controller task body: one iteration per selector cycle.
async fn run<P: DeparturesProvider>(
    provider: P,
    mut selector_rx: watch::Receiver<Option<Selector>>,
    state_tx: watch::Sender<BoardState>,
    config: BoardConfig,
) {
    let mut generation: u64 = 0;

    loop {
        let selector = selector_rx.borrow_and_update().clone();
        generation += 1;

        match selector {
            None => {
                let _ = state_tx.send(BoardState::idle(generation));
                if selector_rx.changed().await.is_err() {
                    return;
                }
            }
            Some(selector) => {
                // The poll cycle never returns on its own; it lives exactly
                // until the selector changes, taking any in-flight fetch and
                // its interval timer with it.
                tokio::select! {
                    _ = poll_cycle(&provider, &state_tx, &selector, generation, &config) => {}
                    changed = selector_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        debug!(%selector, generation, "selector changed, cancelling cycle");
                    }
                }
            }
        }
    }
}

/// One selector's poll cycle: immediate fetch, then a repeating interval.
async fn poll_cycle<P: DeparturesProvider>(
    provider: &P,
    state_tx: &watch::Sender<BoardState>,
    selector: &Selector,
    generation: u64,
    config: &BoardConfig,
) {
    let _ = state_tx.send(BoardState {
        generation,
        phase: BoardPhase::Loading,
    });

    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately.
    interval.tick().await;

    let mut first_fetch = true;
    loop {
        match provider.departures(selector).await {
            Ok(snapshot) => {
                let board = prepare_board(&snapshot);
                debug!(
                    %selector,
                    generation,
                    networks = board.networks.len(),
                    "snapshot applied"
                );
                let _ = state_tx.send(BoardState {
                    generation,
                    phase: BoardPhase::Ready {
                        board,
                        refreshed_at: Utc::now(),
                    },
                });
            }
            Err(e) => {
                warn!(%selector, generation, error = %e, "poll failed");
                if first_fetch {
                    let _ = state_tx.send(BoardState {
                        generation,
                        phase: BoardPhase::Unavailable,
                    });
                }
                // On a refresh failure the last good snapshot stays visible
                // and the interval keeps running for the next attempt.
            }
        }

        first_fetch = false;
        interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::mock::{network_group, route_group, MockUpstream};

    fn sel_a() -> Selector {
        Selector::station("stn-02799")
    }

    fn sel_b() -> Selector {
        Selector::station("stn-uw")
    }

    fn snapshot_two_networks() -> Vec<crate::upstream::NetworkGroup> {
        vec![
            network_group("GRT", vec![route_group("301", "Forest Glen", &[4.0])]),
            network_group("GO", vec![route_group("30", "Kitchener", &[12.0])]),
        ]
    }

    fn snapshot_one_network() -> Vec<crate::upstream::NetworkGroup> {
        vec![network_group("GRT", vec![route_group("301", "Forest Glen", &[1.0])])]
    }

    /// Let the controller task catch up under a paused clock.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_fetch_then_ready() {
        let mock = MockUpstream::new();
        mock.enqueue_ok(&sel_a(), snapshot_two_networks());

        let handle = BoardHandle::spawn(mock.clone(), Some(sel_a()), BoardConfig::default());
        settle().await;

        let state = handle.state();
        assert_eq!(mock.call_count(), 1);
        let board = state.board().expect("board should be ready");
        assert_eq!(board.networks.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_network_leaves_no_residual_rows() {
        let mock = MockUpstream::new();
        mock.enqueue_ok(&sel_a(), snapshot_two_networks());
        mock.enqueue_ok(&sel_a(), snapshot_one_network());

        let handle = BoardHandle::spawn(mock.clone(), Some(sel_a()), BoardConfig::default());
        settle().await;
        assert_eq!(handle.state().board().unwrap().networks.len(), 2);

        // Second poll 30 seconds later fully replaces the snapshot.
        tokio::time::sleep(POLL_INTERVAL).await;
        settle().await;

        let state = handle.state();
        let board = state.board().unwrap();
        assert_eq!(board.networks.len(), 1);
        assert_eq!(board.networks[0].network, "GRT");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_does_not_flicker_back_to_loading() {
        let mock = MockUpstream::new();
        mock.enqueue_ok(&sel_a(), snapshot_one_network());

        let handle = BoardHandle::spawn(mock.clone(), Some(sel_a()), BoardConfig::default());
        settle().await;

        let mut rx = handle.subscribe();
        rx.borrow_and_update();

        tokio::time::sleep(POLL_INTERVAL).await;
        settle().await;

        // The refresh replaced the snapshot in place; the only observed
        // state is Ready, within the same generation.
        rx.changed().await.unwrap();
        let state = rx.borrow().clone();
        assert!(matches!(state.phase, BoardPhase::Ready { .. }));
        assert_eq!(state.generation, handle.state().generation);
    }

    #[tokio::test(start_paused = true)]
    async fn selector_change_cancels_in_flight_fetch() {
        let mock = MockUpstream::new();
        // Cycle A's response is slow; it must never be applied.
        mock.enqueue_ok_after(&sel_a(), Duration::from_secs(10), snapshot_two_networks());
        mock.enqueue_ok(&sel_b(), snapshot_one_network());

        let handle = BoardHandle::spawn(mock.clone(), Some(sel_a()), BoardConfig::default());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(handle.state().phase, BoardPhase::Loading));

        let generation_a = handle.state().generation;
        handle.set_selector(Some(sel_b()));
        settle().await;

        let state = handle.state();
        assert!(state.generation > generation_a);
        assert_eq!(state.board().unwrap().networks[0].network, "GRT");

        // Well past the slow response's arrival time: it was dropped, not
        // applied.
        tokio::time::sleep(Duration::from_secs(20)).await;
        let state = handle.state();
        assert_eq!(state.board().unwrap().networks.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn old_cycle_timer_never_fires_after_selector_change() {
        let mock = MockUpstream::new();
        mock.enqueue_ok(&sel_a(), snapshot_two_networks());
        mock.enqueue_ok(&sel_b(), snapshot_one_network());

        let handle = BoardHandle::spawn(mock.clone(), Some(sel_a()), BoardConfig::default());
        settle().await;
        handle.set_selector(Some(sel_b()));
        settle().await;

        // Past where cycle A's interval would have fired.
        tokio::time::sleep(POLL_INTERVAL + Duration::from_secs(1)).await;
        settle().await;

        let calls = mock.calls();
        // One A fetch before the change, then only B fetches.
        assert_eq!(calls[0], sel_a());
        assert!(calls[1..].iter().all(|s| *s == sel_b()));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_retains_last_snapshot_and_keeps_polling() {
        let mock = MockUpstream::new();
        mock.enqueue_ok(&sel_a(), snapshot_two_networks());
        mock.enqueue_err(&sel_a(), 502, "bad gateway");

        let handle = BoardHandle::spawn(mock.clone(), Some(sel_a()), BoardConfig::default());
        settle().await;
        let before = handle.state();
        assert_eq!(before.board().unwrap().networks.len(), 2);

        tokio::time::sleep(POLL_INTERVAL).await;
        settle().await;

        // Refresh failed: last good snapshot is still on screen.
        let after = handle.state();
        assert_eq!(after, before);

        // The timer was not stopped by the failure.
        tokio::time::sleep(POLL_INTERVAL).await;
        settle().await;
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_failure_shows_unavailable_then_recovers() {
        let mock = MockUpstream::new();
        mock.enqueue_err(&sel_a(), 500, "boom");
        mock.enqueue_ok(&sel_a(), snapshot_one_network());

        let handle = BoardHandle::spawn(mock.clone(), Some(sel_a()), BoardConfig::default());
        settle().await;
        assert!(matches!(handle.state().phase, BoardPhase::Unavailable));

        tokio::time::sleep(POLL_INTERVAL).await;
        settle().await;
        assert!(handle.state().board().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn no_selector_is_idle_until_one_arrives() {
        let mock = MockUpstream::new();
        mock.enqueue_ok(&sel_a(), snapshot_one_network());

        let handle = BoardHandle::spawn(mock.clone(), None, BoardConfig::default());
        settle().await;
        assert!(matches!(handle.state().phase, BoardPhase::Idle));
        assert_eq!(mock.call_count(), 0);

        handle.set_selector(Some(sel_a()));
        settle().await;
        assert!(handle.state().board().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn setting_the_same_selector_does_not_restart_the_cycle() {
        let mock = MockUpstream::new();
        mock.enqueue_ok(&sel_a(), snapshot_one_network());

        let handle = BoardHandle::spawn(mock.clone(), Some(sel_a()), BoardConfig::default());
        settle().await;
        let generation = handle.state().generation;

        handle.set_selector(Some(sel_a()));
        tokio::time::sleep(Duration::from_secs(5)).await;

        // No new cycle, no extra immediate fetch.
        assert_eq!(handle.state().generation, generation);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_polling() {
        let mock = MockUpstream::new();
        mock.enqueue_ok(&sel_a(), snapshot_one_network());

        let handle = BoardHandle::spawn(mock.clone(), Some(sel_a()), BoardConfig::default());
        settle().await;
        assert_eq!(mock.call_count(), 1);

        drop(handle);
        tokio::time::sleep(POLL_INTERVAL * 3).await;
        assert_eq!(mock.call_count(), 1);
    }
}
