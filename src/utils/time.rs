//! Time utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

const SECONDS_IN_MINUTE: f64 = 60.0;
const SECONDS_IN_HOUR: f64 = 60.0 * SECONDS_IN_MINUTE;
const SECONDS_IN_DAY: f64 = 24.0 * SECONDS_IN_HOUR;
// Averages over leap years
const SECONDS_IN_MONTH: f64 = 30.44 * SECONDS_IN_DAY;
const SECONDS_IN_YEAR: f64 = 365.25 * SECONDS_IN_DAY;

/// Default delay of [`pause`]
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(200);

/// Describe how long before `now` the given date was.
///
/// Dates after `now` keep the same units with an "in the future" suffix,
/// e.g. `"1 hour in the future"`.
pub fn how_long_ago(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let difference = (now - date).num_seconds();
    let suffix = if difference < 0 { "in the future" } else { "ago" };
    let seconds = difference.unsigned_abs() as f64;

    let (amount, unit) = if seconds < SECONDS_IN_MINUTE {
        (seconds, "second")
    } else if seconds < SECONDS_IN_HOUR {
        ((seconds / SECONDS_IN_MINUTE).floor(), "minute")
    } else if seconds < SECONDS_IN_DAY {
        ((seconds / SECONDS_IN_HOUR).floor(), "hour")
    } else if seconds < SECONDS_IN_MONTH {
        ((seconds / SECONDS_IN_DAY).floor(), "day")
    } else if seconds < SECONDS_IN_YEAR {
        ((seconds / SECONDS_IN_MONTH).floor(), "month")
    } else {
        ((seconds / SECONDS_IN_YEAR).floor(), "year")
    };

    let amount = amount as u64;
    let plural = if amount == 1 { "" } else { "s" };

    format!("{amount} {unit}{plural} {suffix}")
}

/// Sleep for `delay`, or [`DEFAULT_PAUSE`] when none is given
pub async fn pause(delay: Option<Duration>) {
    tokio::time::sleep(delay.unwrap_or(DEFAULT_PAUSE)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn ago(seconds: i64) -> String {
        how_long_ago(now() - ChronoDuration::seconds(seconds), now())
    }

    #[test]
    fn test_seconds() {
        assert_eq!(ago(0), "0 seconds ago");
        assert_eq!(ago(1), "1 second ago");
        assert_eq!(ago(59), "59 seconds ago");
    }

    #[test]
    fn test_larger_units() {
        assert_eq!(ago(60), "1 minute ago");
        assert_eq!(ago(150), "2 minutes ago");
        assert_eq!(ago(3600), "1 hour ago");
        assert_eq!(ago(86_400 * 3), "3 days ago");
        assert_eq!(ago(86_400 * 31), "1 month ago");
        assert_eq!(ago(86_400 * 400), "1 year ago");
        assert_eq!(ago(86_400 * 800), "2 years ago");
    }

    #[test]
    fn test_future_dates() {
        assert_eq!(ago(-3600), "1 hour in the future");
        assert_eq!(ago(-30), "30 seconds in the future");
    }

    #[tokio::test]
    async fn test_pause_waits_for_delay() {
        let start = tokio::time::Instant::now();
        pause(None).await;
        assert!(start.elapsed() >= DEFAULT_PAUSE);

        let start = tokio::time::Instant::now();
        pause(Some(Duration::from_millis(5))).await;
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
