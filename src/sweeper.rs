use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, TimeZone, Timelike};
use tracing::{info, warn};

use crate::orderbook::Inner;

/// Tunable knobs for the session sweeper, split out from [`OrderBook::new`]
/// so tests can run the cutoff loop on a short fuse instead of waiting
/// for a real 16:00 local rollover.
#[derive(Debug, Clone, Copy)]
pub struct SweeperConfig {
    /// The local hour (0-23) at which `GoodForDay` orders expire.
    pub cutoff_hour: u32,
    /// Extra delay added past the computed cutoff instant, so a wake
    /// racing the clock edge always lands after it, never before.
    pub guard: Duration,
    /// Bypasses the `cutoff_hour` computation entirely and waits this
    /// long instead. `None` (the default) uses the real daily cutoff;
    /// tests that need a sweep to actually fire within the test's
    /// lifetime set this instead of waiting for wall-clock rollover,
    /// which whole-hour `cutoff_hour` can't express on a short fuse
    /// (an hour that "just passed" rolls to tomorrow, not to a few
    /// milliseconds away).
    pub wait_override: Option<Duration>,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            cutoff_hour: 16,
            guard: Duration::from_millis(100),
            wait_override: None,
        }
    }
}

/// Computes how long to sleep until the next `cutoff_hour:00:00` local
/// time, already past by `guard`. If local time is at or past the
/// cutoff today, targets tomorrow's instead. A `wait_override` skips
/// all of this and is returned as-is.
fn duration_until_next_cutoff(config: SweeperConfig) -> Duration {
    if let Some(wait_override) = config.wait_override {
        return wait_override;
    }

    let now = Local::now();
    let today_cutoff = now
        .with_hour(config.cutoff_hour)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or_else(|| {
            warn!(cutoff_hour = config.cutoff_hour, "invalid sweeper cutoff hour, falling back to midnight");
            Local
                .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
                .single()
                .expect("midnight on a valid local calendar date always resolves")
        });

    let target = if now >= today_cutoff {
        today_cutoff + chrono::Duration::days(1)
    } else {
        today_cutoff
    };

    let until = target
        .signed_duration_since(now)
        .to_std()
        .unwrap_or(Duration::ZERO);
    until + config.guard
}

/// Runs the background session sweeper loop until shutdown.
///
/// Each iteration waits on the book's condvar, bound to the book's
/// own mutex, for either the next cutoff instant or a shutdown
/// notification. A real timeout collects and cancels every resting
/// `GoodForDay` order under the lock; shutdown or a spurious wake that
/// isn't a real timeout simply loops (or exits, on shutdown).
pub(crate) fn run(inner: Arc<Inner>, config: SweeperConfig) {
    loop {
        if inner.shutdown.load(Ordering::Acquire) {
            info!("session sweeper observed shutdown, exiting");
            return;
        }

        let wait_for = duration_until_next_cutoff(config);
        let book_guard = inner.book.lock().expect("order book mutex poisoned");
        let (book_guard, wait_result) = inner
            .condvar
            .wait_timeout(book_guard, wait_for)
            .expect("order book mutex poisoned");
        drop(book_guard);

        if inner.shutdown.load(Ordering::Acquire) {
            info!("session sweeper observed shutdown, exiting");
            return;
        }

        if !wait_result.timed_out() {
            // Spurious wake with no shutdown signalled: recompute and wait again.
            continue;
        }

        let expired = inner.good_for_day_ids();
        if !expired.is_empty() {
            info!(count = expired.len(), "sweeping expired good-for-day orders");
            inner.cancel_orders(&expired);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_today_rolls_to_tomorrow_once_past() {
        let config = SweeperConfig {
            cutoff_hour: 0,
            guard: Duration::from_millis(50),
            wait_override: None,
        };
        let wait = duration_until_next_cutoff(config);
        // Cutoff hour 0 (midnight) has almost certainly already passed
        // today by the time this test runs, so the wait should be
        // close to a full day rather than a few seconds.
        assert!(wait > Duration::from_secs(60 * 60));
    }

    #[test]
    fn test_guard_is_always_added_on_top_of_the_raw_wait() {
        let short_guard = SweeperConfig {
            cutoff_hour: 23,
            guard: Duration::from_millis(1),
            wait_override: None,
        };
        let long_guard = SweeperConfig {
            cutoff_hour: 23,
            guard: Duration::from_secs(10),
            wait_override: None,
        };
        let short_wait = duration_until_next_cutoff(short_guard);
        let long_wait = duration_until_next_cutoff(long_guard);
        assert!(long_wait >= short_wait);
    }

    #[test]
    fn test_wait_override_bypasses_the_cutoff_computation() {
        let config = SweeperConfig {
            cutoff_hour: 16,
            guard: Duration::from_secs(999),
            wait_override: Some(Duration::from_millis(5)),
        };
        assert_eq!(duration_until_next_cutoff(config), Duration::from_millis(5));
    }
}
