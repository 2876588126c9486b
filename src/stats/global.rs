use std::collections::{BTreeMap, HashMap, HashSet};

use crate::accounting::ReceiptRecord;
use crate::error::Result;
use crate::stats::challenge::{date_for_day, day_from_challenge_id};
use crate::stats::types::{
    night_from_star, rate_for_day, AddressStats, DayStats, GlobalStats, GrandTotal,
};

/// Per-address accumulator, kept in first-seen order.
struct AddressBucket<'a> {
    address: &'a str,
    by_day: BTreeMap<u32, u64>,
    timestamps: Vec<&'a str>,
}

/// Per-day accumulator over all addresses.
#[derive(Default)]
struct DayBucket<'a> {
    receipts: u64,
    addresses: HashSet<&'a str>,
}

fn day_stats(
    day: u32,
    receipts: u64,
    addresses: Option<usize>,
    rates: &[f64],
) -> Result<DayStats> {
    let star = receipts as f64 * rate_for_day(rates, day);
    Ok(DayStats {
        day,
        date: date_for_day(day)?,
        receipts,
        addresses,
        star,
        night: night_from_star(star),
    })
}

impl AddressBucket<'_> {
    fn into_stats(mut self, rates: &[f64]) -> Result<AddressStats> {
        let days: Vec<DayStats> = self
            .by_day
            .iter()
            .rev()
            .map(|(&day, &count)| day_stats(day, count, None, rates))
            .collect::<Result<_>>()?;

        let total_receipts = days.iter().map(|d| d.receipts).sum();
        let total_star: f64 = days.iter().map(|d| d.star).sum();

        // Fixed-width ISO strings order chronologically.
        self.timestamps.sort_unstable();

        Ok(AddressStats {
            address: self.address.to_string(),
            days,
            total_receipts,
            total_star,
            total_night: night_from_star(total_star),
            first_solution: self.timestamps.first().map(|s| s.to_string()),
            last_solution: self.timestamps.last().map(|s| s.to_string()),
        })
    }
}

/// Aggregate the whole receipt log into global, per-day and per-address
/// totals. `rates[0]` is the STAR rate for day 1.
///
/// Fails if any receipt carries an undecodable challenge id.
pub fn compute_stats(receipts: &[ReceiptRecord], rates: &[f64]) -> Result<GlobalStats> {
    if receipts.is_empty() {
        return Ok(GlobalStats::default());
    }

    let mut buckets: Vec<AddressBucket> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut by_day: BTreeMap<u32, DayBucket> = BTreeMap::new();

    for r in receipts {
        let day = day_from_challenge_id(&r.challenge_id)?;

        let idx = *index.entry(r.address.as_str()).or_insert_with(|| {
            buckets.push(AddressBucket {
                address: &r.address,
                by_day: BTreeMap::new(),
                timestamps: Vec::new(),
            });
            buckets.len() - 1
        });
        let bucket = &mut buckets[idx];
        *bucket.by_day.entry(day).or_insert(0) += 1;
        bucket.timestamps.push(&r.timestamp);

        let global_day = by_day.entry(day).or_default();
        global_day.receipts += 1;
        global_day.addresses.insert(&r.address);
    }

    let mut addresses: Vec<AddressStats> = buckets
        .into_iter()
        .map(|b| b.into_stats(rates))
        .collect::<Result<_>>()?;
    // Stable: equal counts keep first-seen order.
    addresses.sort_by(|a, b| b.total_receipts.cmp(&a.total_receipts));

    let days: Vec<DayStats> = by_day
        .iter()
        .rev()
        .map(|(&day, bucket)| day_stats(day, bucket.receipts, Some(bucket.addresses.len()), rates))
        .collect::<Result<_>>()?;

    let mut grand_total = GrandTotal::default();
    for a in &addresses {
        grand_total.star += a.total_star;
        grand_total.receipts += a.total_receipts;
    }
    grand_total.night = night_from_star(grand_total.star);

    tracing::debug!(
        receipts = receipts.len(),
        addresses = addresses.len(),
        days = days.len(),
        "computed global stats"
    );

    Ok(GlobalStats {
        total_receipts: receipts.len() as u64,
        total_addresses: addresses.len(),
        start_date: days.last().map(|d| d.date),
        end_date: days.first().map(|d| d.date),
        days,
        addresses,
        grand_total,
    })
}
