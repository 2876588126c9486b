use chrono::{DateTime, Utc};

use crate::accounting::ReceiptRecord;
use crate::error::Result;
use crate::stats::global::compute_stats;
use crate::stats::hourly::{last_n_hours, previous_hour, stamp};
use crate::stats::rate::per_hour;
use crate::stats::types::{ErrorSummary, RateSummary, StatsReport};

const RECENT_HOURS: usize = 8;

/// Build the full statistics response for one request.
///
/// All-or-nothing: the first malformed receipt fails the whole report.
/// `errors_total` is the failed-submission count kept by the receipt log.
pub fn build_report_at(
    receipts: &[ReceiptRecord],
    rates: &[f64],
    errors_total: u64,
    now: DateTime<Utc>,
) -> Result<StatsReport> {
    let global = compute_stats(receipts, rates)?;
    let stamped = stamp(receipts)?;
    let hourly = previous_hour(&stamped, rates, now)?;
    let last_8_hours = last_n_hours(&stamped, rates, RECENT_HOURS, now)?;
    let rate = RateSummary {
        per_hour_24h: per_hour(&stamped, 24, now),
        per_hour_1h: per_hour(&stamped, 1, now),
    };

    let today_date = now.date_naive();
    let today = global.days.iter().find(|d| d.date == today_date).cloned();

    Ok(StatsReport {
        global,
        hourly,
        last_8_hours,
        today,
        rate,
        errors: ErrorSummary {
            total: errors_total,
        },
    })
}

pub fn build_report(
    receipts: &[ReceiptRecord],
    rates: &[f64],
    errors_total: u64,
) -> Result<StatsReport> {
    build_report_at(receipts, rates, errors_total, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatsError;
    use crate::stats::hourly::parse_timestamp;

    fn receipt(ts: &str, address: &str, challenge_id: &str) -> ReceiptRecord {
        ReceiptRecord {
            timestamp: ts.to_string(),
            address: address.to_string(),
            challenge_id: challenge_id.to_string(),
            nonce: "ff".to_string(),
            hash: Some("00ab".to_string()),
        }
    }

    #[test]
    fn test_report_composes_all_parts() {
        let receipts = vec![
            receipt("2025-11-04T09:00:00Z", "A", "**D06C03"),
            receipt("2025-11-05T10:15:00Z", "A", "**D07C01"),
            receipt("2025-11-05T10:45:00Z", "B", "**D07C01"),
            receipt("2025-11-05T11:10:00Z", "B", "**D07C02"),
        ];
        let rates = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0];
        let now = parse_timestamp("2025-11-05T11:30:00Z").unwrap();

        let report = build_report_at(&receipts, &rates, 5, now).unwrap();

        assert_eq!(report.global.total_receipts, 4);
        assert_eq!(report.errors.total, 5);

        let hourly = report.hourly.clone().unwrap();
        assert_eq!(hourly.hour, "2025-11-05T10:00:00.000Z");
        assert_eq!(hourly.receipts, 2);
        assert_eq!(hourly.star, 4.0);

        assert_eq!(report.last_8_hours.len(), 8);
        assert_eq!(report.last_8_hours[7], hourly);
        assert_eq!(report.last_8_hours[0].hour, "2025-11-05T03:00:00.000Z");

        let today = report.today.unwrap();
        assert_eq!(today.day, 7);
        assert_eq!(today.receipts, 3);
        assert_eq!(today.addresses, Some(2));

        assert_eq!(report.rate.per_hour_1h, 2.0);
        assert_eq!(report.rate.per_hour_24h, 3.0 / 24.0);
    }

    #[test]
    fn test_report_without_receipts() {
        let now = parse_timestamp("2025-11-05T11:30:00Z").unwrap();
        let report = build_report_at(&[], &[], 0, now).unwrap();
        assert_eq!(report.global.total_receipts, 0);
        assert!(report.hourly.is_none());
        assert!(report.last_8_hours.is_empty());
        assert!(report.today.is_none());
        assert_eq!(report.rate, RateSummary::default());
    }

    #[test]
    fn test_report_no_activity_today() {
        let receipts = vec![receipt("2025-11-01T09:00:00Z", "A", "**D03C03")];
        let now = parse_timestamp("2025-11-05T11:30:00Z").unwrap();
        let report = build_report_at(&receipts, &[], 0, now).unwrap();
        assert!(report.today.is_none());
        assert_eq!(report.last_8_hours.len(), 8);
    }

    #[test]
    fn test_report_fails_as_a_whole() {
        let receipts = vec![
            receipt("2025-11-05T10:15:00Z", "A", "**D07C01"),
            receipt("2025-11-05T10:16:00Z", "A", "D7"),
        ];
        let now = parse_timestamp("2025-11-05T11:30:00Z").unwrap();
        assert!(matches!(
            build_report_at(&receipts, &[], 0, now),
            Err(StatsError::InvalidChallengeId(_))
        ));
    }
}
