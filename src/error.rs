use thiserror::Error;

/// Failure of a statistics computation.
///
/// The receipt log held data the aggregator cannot place in time, or a
/// requested window lies outside chrono's range. Either way the whole
/// computation is refused rather than skewed.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("invalid challenge id: {0:?}")]
    InvalidChallengeId(String),

    #[error("mining day {0} has no calendar date")]
    DayOutOfRange(u32),

    #[error("window of {hours} hours reaches outside the representable time range")]
    WindowOutOfRange { hours: u64 },

    #[error("invalid receipt timestamp {timestamp:?}: {source}")]
    InvalidTimestamp {
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, StatsError>;
