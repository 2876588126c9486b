use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// STAR per NIGHT.
pub const STAR_PER_NIGHT: f64 = 1_000_000.0;

#[inline]
pub fn night_from_star(star: f64) -> f64 {
    star / STAR_PER_NIGHT
}

/// STAR per receipt for a mining day. Index 0 of `rates` is day 1; a day
/// beyond the end of the table earns nothing.
#[inline]
pub fn rate_for_day(rates: &[f64], day: u32) -> f64 {
    day.checked_sub(1)
        .and_then(|idx| rates.get(idx as usize))
        .copied()
        .unwrap_or(0.0)
}

/// Totals for one mining day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStats {
    pub day: u32,
    pub date: NaiveDate,
    pub receipts: u64,
    /// Distinct addresses. Only set on the global day list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<usize>,
    pub star: f64,
    pub night: f64,
}

/// Totals for one clock hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourStats {
    /// Start of the hour, e.g. `2025-11-05T10:00:00.000Z`
    pub hour: String,
    pub receipts: u64,
    pub addresses: usize,
    pub star: f64,
    pub night: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressStats {
    pub address: String,
    /// Most recent day first.
    pub days: Vec<DayStats>,
    pub total_receipts: u64,
    pub total_star: f64,
    pub total_night: f64,
    pub first_solution: Option<String>,
    pub last_solution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrandTotal {
    pub star: f64,
    pub night: f64,
    pub receipts: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_receipts: u64,
    pub total_addresses: usize,
    /// Most recent day first.
    pub days: Vec<DayStats>,
    /// Highest receipt count first.
    pub addresses: Vec<AddressStats>,
    pub grand_total: GrandTotal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSummary {
    pub per_hour_24h: f64,
    pub per_hour_1h: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    pub total: u64,
}

/// The full statistics response handed to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub global: GlobalStats,
    pub hourly: Option<HourStats>,
    #[serde(rename = "last8Hours")]
    pub last_8_hours: Vec<HourStats>,
    pub today: Option<DayStats>,
    pub rate: RateSummary,
    pub errors: ErrorSummary,
}
