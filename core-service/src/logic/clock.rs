//! Time helpers shared by the extractor and the score manager.

use chrono::{DateTime, Duration, Utc};

/// Signed duration in fractional seconds (microsecond precision).
pub fn duration_secs(d: Duration) -> f64 {
    match d.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => d.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Upper bound for second-valued config fields (100 years).
const MAX_CONFIG_SECS: u64 = 100 * 365 * 24 * 3600;

/// Whole-second config value as a chrono duration.
pub fn secs(value: u64) -> Duration {
    Duration::seconds(value.min(MAX_CONFIG_SECS) as i64)
}

/// Caps a caller-supplied timestamp at `received_at + skew`.
///
/// Returns the effective time and whether it was clamped. Without a
/// receive time the timestamp is taken as is.
pub fn clamp_to_receipt(
    timestamp: DateTime<Utc>,
    received_at: Option<DateTime<Utc>>,
    skew: Duration,
) -> (DateTime<Utc>, bool) {
    let Some(limit) = received_at.and_then(|r| r.checked_add_signed(skew)) else {
        return (timestamp, false);
    };
    if timestamp > limit {
        (limit, true)
    } else {
        (timestamp, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_future_timestamp_clamped_to_skew() {
        let received = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        let skew = Duration::minutes(5);

        let (at, clamped) = clamp_to_receipt(received + Duration::days(365 * 50), Some(received), skew);
        assert!(clamped);
        assert_eq!(at, received + skew);

        let (at, clamped) = clamp_to_receipt(received + Duration::minutes(4), Some(received), skew);
        assert!(!clamped);
        assert_eq!(at, received + Duration::minutes(4));

        let past = received - Duration::hours(2);
        assert_eq!(clamp_to_receipt(past, Some(received), skew), (past, false));
        assert_eq!(clamp_to_receipt(received + Duration::days(1), None, skew).1, false);
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(duration_secs(Duration::milliseconds(2500)), 2.5);
        assert_eq!(duration_secs(Duration::milliseconds(-200)), -0.2);
        assert_eq!(duration_secs(Duration::zero()), 0.0);
    }

    #[test]
    fn test_secs() {
        assert_eq!(secs(300), Duration::seconds(300));
        assert_eq!(secs(u64::MAX), Duration::seconds(MAX_CONFIG_SECS as i64));
    }
}
