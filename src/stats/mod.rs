//! Receipt statistics: a stateless `(receipts, rates) -> statistics`
//! transform. Nothing here performs I/O.

pub mod challenge;
pub mod global;
pub mod hourly;
pub mod rate;
pub mod report;
pub mod types;

pub use challenge::{date_for_day, date_from_challenge_id, day_from_challenge_id};
pub use global::compute_stats;
pub use hourly::{
    compute_hourly_stats, compute_hourly_stats_at, compute_last_n_hours, compute_last_n_hours_at,
};
pub use rate::{solutions_per_hour, solutions_per_hour_at};
pub use report::{build_report, build_report_at};
pub use types::*;
