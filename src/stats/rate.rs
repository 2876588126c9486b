use chrono::{DateTime, TimeDelta, Utc};

use crate::accounting::ReceiptRecord;
use crate::error::Result;
use crate::stats::hourly::{stamp, Stamped};

pub(crate) fn per_hour(stamped: &[Stamped], hours: u32, now: DateTime<Utc>) -> f64 {
    if stamped.is_empty() || hours == 0 {
        return 0.0;
    }
    // A window reaching past the earliest representable instant covers everything.
    let cutoff = now.checked_sub_signed(TimeDelta::milliseconds(i64::from(hours) * 3_600_000));
    let recent = match cutoff {
        Some(cutoff) => stamped.iter().filter(|(ts, _)| *ts >= cutoff).count(),
        None => stamped.len(),
    };
    recent as f64 / f64::from(hours)
}

/// Average receipts per hour over the trailing `hours` hours ending at
/// `now`. Not snapped to hour boundaries.
pub fn solutions_per_hour_at(
    receipts: &[ReceiptRecord],
    hours: u32,
    now: DateTime<Utc>,
) -> Result<f64> {
    if receipts.is_empty() || hours == 0 {
        return Ok(0.0);
    }
    Ok(per_hour(&stamp(receipts)?, hours, now))
}

pub fn solutions_per_hour(receipts: &[ReceiptRecord], hours: u32) -> Result<f64> {
    solutions_per_hour_at(receipts, hours, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatsError;
    use crate::stats::hourly::parse_timestamp;

    fn receipt(ts: &str) -> ReceiptRecord {
        ReceiptRecord {
            timestamp: ts.to_string(),
            address: "A".to_string(),
            challenge_id: "**D07C01".to_string(),
            nonce: "0".to_string(),
            hash: None,
        }
    }

    fn at(ts: &str) -> DateTime<Utc> {
        parse_timestamp(ts).unwrap()
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(solutions_per_hour(&[], 24).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_hours_is_zero() {
        let now = at("2025-11-05T12:00:00Z");
        let receipts = vec![receipt("2025-11-05T11:59:00Z")];
        assert_eq!(solutions_per_hour_at(&receipts, 0, now).unwrap(), 0.0);
    }

    #[test]
    fn test_one_hour_window_is_trailing_not_snapped() {
        let now = at("2025-11-05T12:30:00Z");
        let receipts = vec![
            receipt("2025-11-05T11:29:59.999Z"),
            receipt("2025-11-05T11:30:00.000Z"),
            receipt("2025-11-05T12:00:00.000Z"),
            receipt("2025-11-05T12:29:00.000Z"),
        ];
        assert_eq!(solutions_per_hour_at(&receipts, 1, now).unwrap(), 3.0);
    }

    #[test]
    fn test_24h_average() {
        let now = at("2025-11-05T12:00:00Z");
        let receipts = vec![
            receipt("2025-11-04T11:00:00Z"),
            receipt("2025-11-04T13:00:00Z"),
            receipt("2025-11-05T01:00:00Z"),
            receipt("2025-11-05T11:00:00Z"),
        ];
        assert_eq!(solutions_per_hour_at(&receipts, 24, now).unwrap(), 3.0 / 24.0);
    }

    #[test]
    fn test_bad_timestamp_fails() {
        let now = at("2025-11-05T12:00:00Z");
        let receipts = vec![receipt("not-a-time")];
        assert!(matches!(
            solutions_per_hour_at(&receipts, 1, now),
            Err(StatsError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_huge_window_counts_everything() {
        let now = at("2025-11-05T12:00:00Z");
        let receipts = vec![receipt("2025-11-05T11:00:00Z"), receipt("1970-01-01T00:00:00Z")];
        let rate = solutions_per_hour_at(&receipts, u32::MAX, now).unwrap();
        assert_eq!(rate, 2.0 / f64::from(u32::MAX));
        assert!(solutions_per_hour(&receipts, u32::MAX).unwrap() > 0.0);
    }
}
