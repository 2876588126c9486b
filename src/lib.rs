pub mod accounting;
pub mod api;
pub mod dashboard;
pub mod error;
pub mod stats;

pub use error::StatsError;
