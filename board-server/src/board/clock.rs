//! The board's wall clock.
//!
//! A 1-second ticker localized to a fixed time zone, fully independent of
//! the poll cycle: a poll never resets it and it never triggers a fetch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Tick resolution of the clock.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Format an instant as the board displays it: `HH:MM:SS` in the given zone.
pub fn format_clock(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M:%S").to_string()
}

/// A running clock ticker. Dropping it stops the ticks.
pub struct BoardClock {
    rx: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl BoardClock {
    /// Start a clock in the given time zone. The current time is available
    /// immediately; ticks follow every second.
    pub fn spawn(tz: Tz) -> Self {
        let (tx, rx) = watch::channel(format_clock(Utc::now(), tz));

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLOCK_TICK);
            // First tick completes immediately; the initial value already
            // covers it.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(format_clock(Utc::now(), tz)).is_err() {
                    return;
                }
            }
        });

        Self { rx, task }
    }

    /// The current formatted time.
    pub fn current(&self) -> String {
        self.rx.borrow().clone()
    }

    /// Subscribe to ticks.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }
}

impl Drop for BoardClock {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_in_eastern_standard_time() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 15, 17, 5, 9).unwrap();
        assert_eq!(format_clock(instant, chrono_tz::America::Toronto), "12:05:09");
    }

    #[test]
    fn formats_in_eastern_daylight_time() {
        let instant = Utc.with_ymd_and_hms(2026, 7, 15, 17, 5, 9).unwrap();
        assert_eq!(format_clock(instant, chrono_tz::America::Toronto), "13:05:09");
    }

    #[test]
    fn formats_midnight_with_leading_zeros() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 15, 5, 0, 0).unwrap();
        assert_eq!(format_clock(instant, chrono_tz::America::Toronto), "00:00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_second() {
        let clock = BoardClock::spawn(chrono_tz::America::Toronto);
        let mut rx = clock.subscribe();
        rx.borrow_and_update();

        for _ in 0..3 {
            tokio::time::sleep(CLOCK_TICK).await;
            tokio::time::sleep(Duration::from_millis(1)).await;
            assert!(rx.has_changed().unwrap());
            rx.borrow_and_update();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_clock_stops_ticks() {
        let clock = BoardClock::spawn(chrono_tz::America::Toronto);
        let mut rx = clock.subscribe();
        rx.borrow_and_update();
        drop(clock);

        tokio::time::sleep(CLOCK_TICK * 3).await;
        // The sender task is gone; no further ticks arrive.
        assert!(rx.changed().await.is_err());
    }
}
