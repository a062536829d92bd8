//! Utility functions for the matchmaking service

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Elapsed seconds between two timestamps, as a float
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_elapsed_seconds() {
        let start = current_timestamp();
        let end = start + Duration::milliseconds(1500);
        assert_eq!(elapsed_seconds(start, end), 1.5);
    }

    #[test]
    fn test_elapsed_seconds_zero() {
        let now = current_timestamp();
        assert_eq!(elapsed_seconds(now, now), 0.0);
    }
}
