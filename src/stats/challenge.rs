use chrono::{Days, NaiveDate};

use crate::error::{Result, StatsError};

/// Calendar date of mining day 1.
pub const EPOCH_ANCHOR: NaiveDate = match NaiveDate::from_ymd_opt(2025, 10, 30) {
    Some(d) => d,
    None => panic!("invalid epoch anchor"),
};

/// Extract the mining day from a challenge id such as `"**D06C22"`.
///
/// The id must contain a `D`, at least two digits, then `C`. Day 0 is
/// rejected because mining days are 1-based, as is any day too large to
/// have a calendar date.
pub fn day_from_challenge_id(id: &str) -> Result<u32> {
    for (pos, _) in id.match_indices('D') {
        let rest = &id[pos + 1..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits < 2 || !rest[digits..].starts_with('C') {
            continue;
        }
        return match rest[..digits].parse::<u32>() {
            Ok(day) if day > 0 && date_for_day(day).is_ok() => Ok(day),
            _ => Err(StatsError::InvalidChallengeId(id.to_string())),
        };
    }
    Err(StatsError::InvalidChallengeId(id.to_string()))
}

/// Calendar date for a mining day: the anchor plus `day - 1` whole days.
pub fn date_for_day(day: u32) -> Result<NaiveDate> {
    day.checked_sub(1)
        .and_then(|offset| EPOCH_ANCHOR.checked_add_days(Days::new(u64::from(offset))))
        .ok_or(StatsError::DayOutOfRange(day))
}

pub fn date_from_challenge_id(id: &str) -> Result<NaiveDate> {
    day_from_challenge_id(id).and_then(date_for_day)
}
