use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Validation failures for user-editable configuration. These are always
/// caught before a run is dispatched; the session itself is never touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("initial capital must be greater than zero, got {0}")]
    InvalidInitialCapital(Decimal),
    #[error("fee ratio must be within [0, 0.01], got {0}")]
    InvalidFeeRatio(Decimal),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

pub type Result<T> = std::result::Result<T, Error>;
