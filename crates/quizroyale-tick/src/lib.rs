//! Fixed-interval tick scheduler for Quizroyale.
//!
//! A lobby's elimination round runs on one of these. The interval is long
//! (tens of seconds) and a late round must never be replayed in a burst,
//! so missed ticks are skipped: after a late tick the next one is a full
//! interval away.
//!
//! # Integration
//!
//! The scheduler drives the lobby's elimination timer task, which stops
//! once the lobby drops its event receiver:
//!
//! ```ignore
//! let mut scheduler = TickScheduler::every(interval);
//! loop {
//!     scheduler.wait_for_tick().await;
//!     if events.send(LobbyEvent::EliminationTick).is_err() {
//!         break;
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Information about a fired tick, returned by
/// [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// How many whole intervals were missed (0 in normal operation).
    pub ticks_skipped: u64,
}

/// Fixed-interval tick scheduler. One per lobby elimination task.
pub struct TickScheduler {
    interval: Duration,
    tick_count: u64,
    next_tick: Instant,
}

impl TickScheduler {
    /// Shortest interval accepted; anything below is raised to this.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// A scheduler whose first tick is one `interval` from now. A zero
    /// interval would spin, so it is raised to [`Self::MIN_INTERVAL`].
    pub fn every(interval: Duration) -> Self {
        let interval = if interval < Self::MIN_INTERVAL {
            warn!(?interval, "tick interval too short, raising to minimum");
            Self::MIN_INTERVAL
        } else {
            interval
        };
        debug!(?interval, "tick scheduler created");

        Self {
            interval,
            tick_count: 0,
            next_tick: Instant::now() + interval,
        }
    }

    /// Waits until the next tick is due.
    ///
    /// Cancel-safe: dropping the future leaves the schedule untouched.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let due = self.next_tick;
        time::sleep_until(due).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(due);
        let ticks_skipped =
            u64::try_from(late_by.as_nanos() / self.interval.as_nanos())
                .unwrap_or(u64::MAX);
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
        }
        self.next_tick = now + self.interval;

        trace!(tick = self.tick_count, "tick fired");
        TickInfo {
            tick: self.tick_count,
            ticks_skipped,
        }
    }
}
