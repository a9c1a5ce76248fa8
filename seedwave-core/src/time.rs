//! Playback time conversion and formatting.

use std::time::Duration;

/// Format seconds as `m:ss`, the way the player shows elapsed and total time.
///
/// Negative and non-finite values display as `0:00`.
#[must_use]
pub fn format_time(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{}:{:02}", total / 60, total % 60)
}

/// Convert seconds to a [`Duration`], saturating instead of panicking on
/// negative, NaN or overly large input.
#[must_use]
pub fn secs_to_duration(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

fn whole_seconds(seconds: f64) -> u64 {
    secs_to_duration(seconds).as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.9), "0:05");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(600.0), "10:00");
    }

    #[test]
    fn test_format_time_invalid() {
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_secs_to_duration() {
        assert_eq!(secs_to_duration(1.5), Duration::from_millis(1500));
        assert_eq!(secs_to_duration(-1.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::INFINITY), Duration::ZERO);
        assert_eq!(secs_to_duration(1e30), Duration::MAX);
    }
}
