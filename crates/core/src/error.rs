use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid date range: {end} is before {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("A {days}-day window ending {end} is outside the supported calendar")]
    WindowOutOfRange { end: NaiveDate, days: u32 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unrecognised {kind}: {value}")]
    Parse { kind: &'static str, value: String },
}
