//! Relative time wording for notification timestamps.

use chrono::{DateTime, Utc};

/// Describe how long ago `then` was, relative to `now`.
///
/// Buckets: seconds under a minute, minutes under an hour, hours under a
/// day, days under a week, then weeks. Timestamps in the future read as
/// `"0 secs ago"`.
///
/// ```
/// use chrono::{Duration, Utc};
/// use shopmate_core::time::time_ago;
///
/// let now = Utc::now();
/// assert_eq!(time_ago(now - Duration::minutes(1), now), "1 min ago");
/// assert_eq!(time_ago(now - Duration::days(15), now), "2 weeks ago");
/// ```
#[must_use]
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let mins = secs / 60;
    let hours = mins / 60;
    let days = hours / 24;

    if secs < 60 {
        plural(secs, "sec")
    } else if mins < 60 {
        plural(mins, "min")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        plural(days / 7, "week")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
