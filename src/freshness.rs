//! Time-to-live checks for extracted codes.
//!
//! `now` is always passed in by the caller so that every account in one
//! aggregate view is judged against the same instant.

use chrono::{DateTime, Local};
use std::time::Duration;

/// Decides whether a code is still usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessFilter {
    ttl: Duration,
}

impl FreshnessFilter {
    /// Creates a filter with the given time-to-live.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// The configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// See [`is_fresh`].
    #[must_use]
    pub fn is_fresh(&self, timestamp: Option<DateTime<Local>>, now: DateTime<Local>) -> bool {
        is_fresh(timestamp, self.ttl, now)
    }
}

/// True iff `timestamp` is present and `now - timestamp <= ttl`.
///
/// The boundary is inclusive. Timestamps in the future count as fresh.
///
/// # Example
///
/// ```
/// use chrono::{Duration as ChronoDuration, Local};
/// use otp_inbox::freshness::is_fresh;
/// use std::time::Duration;
///
/// let now = Local::now();
/// let ttl = Duration::from_secs(300);
/// assert!(is_fresh(Some(now - ChronoDuration::seconds(300)), ttl, now));
/// assert!(!is_fresh(Some(now - ChronoDuration::seconds(301)), ttl, now));
/// assert!(!is_fresh(None, ttl, now));
/// ```
#[must_use]
pub fn is_fresh(timestamp: Option<DateTime<Local>>, ttl: Duration, now: DateTime<Local>) -> bool {
    let Some(timestamp) = timestamp else {
        return false;
    };

    // A TTL too large for chrono never expires anything.
    let Ok(ttl) = chrono::Duration::from_std(ttl) else {
        return true;
    };

    now.signed_duration_since(timestamp) <= ttl
}
