use std::collections::HashSet;

use chrono::{DateTime, DurationRound, SecondsFormat, TimeDelta, Utc};

use crate::accounting::ReceiptRecord;
use crate::error::{Result, StatsError};
use crate::stats::challenge::day_from_challenge_id;
use crate::stats::types::{night_from_star, rate_for_day, HourStats};

pub(crate) fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| StatsError::InvalidTimestamp {
            timestamp: ts.to_string(),
            source,
        })
}

/// Truncate to the start of the containing clock hour.
pub(crate) fn hour_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(TimeDelta::hours(1)).unwrap_or(t)
}

/// A receipt paired with its parsed timestamp.
pub(crate) type Stamped<'a> = (DateTime<Utc>, &'a ReceiptRecord);

/// Parse every receipt timestamp once, failing on the first bad one.
pub(crate) fn stamp(receipts: &[ReceiptRecord]) -> Result<Vec<Stamped<'_>>> {
    receipts
        .iter()
        .map(|r| parse_timestamp(&r.timestamp).map(|ts| (ts, r)))
        .collect()
}

/// Start of the clock hour `back` hours before the one containing `now`.
fn hour_start(now: DateTime<Utc>, back: usize) -> Result<DateTime<Utc>> {
    i64::try_from(back)
        .ok()
        .and_then(TimeDelta::try_hours)
        .and_then(|d| hour_floor(now).checked_sub_signed(d))
        .ok_or(StatsError::WindowOutOfRange { hours: back as u64 })
}

/// Totals for receipts with `start <= timestamp < start + 1h`. STAR uses
/// each receipt's own day rate, so an hour straddling two mining days is
/// priced correctly.
fn stats_for_hour(stamped: &[Stamped], rates: &[f64], start: DateTime<Utc>) -> Result<HourStats> {
    let end = start + TimeDelta::hours(1);
    let mut count = 0u64;
    let mut star = 0.0;
    let mut addresses: HashSet<&str> = HashSet::new();

    for &(ts, r) in stamped {
        if ts < start || ts >= end {
            continue;
        }
        let day = day_from_challenge_id(&r.challenge_id)?;
        count += 1;
        star += rate_for_day(rates, day);
        addresses.insert(&r.address);
    }

    Ok(HourStats {
        hour: start.to_rfc3339_opts(SecondsFormat::Millis, true),
        receipts: count,
        addresses: addresses.len(),
        star,
        night: night_from_star(star),
    })
}

pub(crate) fn previous_hour(
    stamped: &[Stamped],
    rates: &[f64],
    now: DateTime<Utc>,
) -> Result<Option<HourStats>> {
    if stamped.is_empty() {
        return Ok(None);
    }
    stats_for_hour(stamped, rates, hour_start(now, 1)?).map(Some)
}

pub(crate) fn last_n_hours(
    stamped: &[Stamped],
    rates: &[f64],
    hours: usize,
    now: DateTime<Utc>,
) -> Result<Vec<HourStats>> {
    if stamped.is_empty() || hours == 0 {
        return Ok(Vec::new());
    }
    (1..=hours)
        .rev()
        .map(|back| stats_for_hour(stamped, rates, hour_start(now, back)?))
        .collect()
}

/// Stats for the last completed clock hour before `now`.
///
/// `None` only when there are no receipts at all; an hour without
/// receipts yields zeroed stats labelled with that hour.
pub fn compute_hourly_stats_at(
    receipts: &[ReceiptRecord],
    rates: &[f64],
    now: DateTime<Utc>,
) -> Result<Option<HourStats>> {
    previous_hour(&stamp(receipts)?, rates, now)
}

pub fn compute_hourly_stats(
    receipts: &[ReceiptRecord],
    rates: &[f64],
) -> Result<Option<HourStats>> {
    compute_hourly_stats_at(receipts, rates, Utc::now())
}

/// One entry per completed clock hour for the `hours` hours before the one
/// containing `now`, oldest first. Entry `i` from the end covers
/// `[floor(now) - (i+1)h, floor(now) - i h)`.
pub fn compute_last_n_hours_at(
    receipts: &[ReceiptRecord],
    rates: &[f64],
    hours: usize,
    now: DateTime<Utc>,
) -> Result<Vec<HourStats>> {
    last_n_hours(&stamp(receipts)?, rates, hours, now)
}

pub fn compute_last_n_hours(
    receipts: &[ReceiptRecord],
    rates: &[f64],
    hours: usize,
) -> Result<Vec<HourStats>> {
    compute_last_n_hours_at(receipts, rates, hours, Utc::now())
}
