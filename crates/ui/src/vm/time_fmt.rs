use chrono::{DateTime, Utc};

/// Wall-clock label for the last leaderboard refresh.
#[must_use]
pub fn format_refreshed_at(value: DateTime<Utc>) -> String {
    value.format("%H:%M:%S UTC").to_string()
}
