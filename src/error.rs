//! Errors for loading the dataset and selecting a date range.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while reading the loan CSV. Every parse failure names the
/// data row (1-based, header excluded), the column and the raw value.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: column `{column}` is not a valid date: {value:?}")]
    InvalidDate {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: column `{column}` is not numeric: {value:?}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
}

#[derive(Error, Debug, PartialEq)]
pub enum RangeError {
    #[error("dataset is empty, no date range can be selected")]
    EmptyDataset,

    #[error("start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("range {start}..={end} is outside the dataset bounds {min}..={max}")]
    OutOfBounds {
        start: NaiveDate,
        end: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },
}
