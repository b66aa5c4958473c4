//! Time source for archive progress
//!
//! Progress is derived from wall-clock time elapsed since the job started.
//! The clock is a trait so tests can drive time by hand with [`ManualClock`].

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time via [`Utc::now`]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
///
/// Stores milliseconds since the Unix epoch in a shared atomic, so clones
/// observe the same time. Hand one clone to the archiver and keep another
/// to advance time from the test.
///
/// # Examples
///
/// ```
/// use contact_archiver::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::default();
/// let t0 = clock.now();
/// clock.advance(Duration::from_secs(5));
/// assert_eq!((clock.now() - t0).num_seconds(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    /// Jump to an absolute time (may move backwards)
    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    /// Move forward by `by`
    pub fn advance(&self, by: Duration) {
        let delta = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(delta))
            })
            .ok();
    }
}

impl Default for ManualClock {
    /// Frozen at 2024-01-01T00:00:00Z
    fn default() -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(1_704_067_200_000)),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_frozen_until_advanced() {
        let clock = ManualClock::default();
        let first = clock.now();
        assert_eq!(clock.now(), first);

        clock.advance(Duration::from_millis(1500));
        assert_eq!((clock.now() - first).num_milliseconds(), 1500);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::default();
        let handle = clock.clone();
        let start = clock.now();

        handle.advance(Duration::from_secs(3));

        assert_eq!(
            (clock.now() - start).num_seconds(),
            3,
            "original should observe time advanced via the clone"
        );
    }

    #[test]
    fn manual_clock_set_can_move_backwards() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::from_secs(60));

        clock.set(start);

        assert_eq!(clock.now(), start);
    }

    #[test]
    fn system_clock_tracks_wall_time() {
        let before = Utc::now();
        let now = SystemClock.now();
        let after = Utc::now();
        assert!(before <= now && now <= after);
    }
}
