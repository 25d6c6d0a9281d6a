//! Time utilities and constants for fxquote.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Engine timing constants.
pub mod constants {
    use super::Duration;

    /// How long a cached anchor snapshot counts as fresh (10 minutes).
    pub fn cache_freshness_window() -> Duration {
        Duration::minutes(10)
    }

    /// Upper bound on a single provider call (5 seconds).
    pub fn provider_timeout() -> Duration {
        Duration::seconds(5)
    }

    /// Default history window in calendar days.
    pub const DEFAULT_HISTORY_WINDOW_DAYS: u32 = 30;

    /// Largest history window a caller may request.
    pub const MAX_HISTORY_WINDOW_DAYS: u32 = 366;

    /// Windows (in points back from the latest) that trend changes are computed over.
    pub const TREND_WINDOWS: [usize; 3] = [1, 7, 30];
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Today's calendar date in UTC.
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Whether `stored_at` is younger than `window` relative to now.
pub fn is_within(stored_at: Timestamp, window: Duration) -> bool {
    now().signed_duration_since(stored_at) < window
}

/// Clamp a provider-supplied timestamp so it never lies in the future.
pub fn not_after_now(ts: Timestamp) -> Timestamp {
    ts.min(now())
}

/// The date `days` days before `end`.
///
/// The window `window_start(end, days)..=end` holds `days + 1` calendar days,
/// so a change over `days` days has its reference point inside it.
pub fn window_start(end: NaiveDate, days: u32) -> NaiveDate {
    end - Duration::days(i64::from(days))
}

/// Duration extensions for convenient construction.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_within() {
        let recent = now() - Duration::seconds(10);
        assert!(is_within(recent, constants::cache_freshness_window()));

        let old = now() - Duration::minutes(11);
        assert!(!is_within(old, constants::cache_freshness_window()));
    }

    #[test]
    fn test_not_after_now() {
        let future = now() + Duration::hours(3);
        assert!(not_after_now(future) <= now());

        let past = now() - Duration::hours(3);
        assert_eq!(not_after_now(past), past);
    }

    #[test]
    fn test_window_start() {
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let start = window_start(end, 30);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!((end - start).num_days(), 30);
        assert_eq!(window_start(end, 0), end);
    }

    #[test]
    fn test_negative_duration_as_std() {
        assert_eq!(Duration::seconds(-1).as_std(), std::time::Duration::ZERO);
        assert_eq!(
            Duration::milliseconds(1500).as_std(),
            std::time::Duration::from_millis(1500)
        );
    }
}
