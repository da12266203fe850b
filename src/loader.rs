use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};

use crate::error::LoadError;
use crate::models::LoanRecord;

#[derive(serde::Deserialize)]
struct CsvRow {
    member_id: String,
    loan_amnt: String,
    int_rate: String,
    loan_status: String,
    purpose: String,
    emp_length: String,
    home_ownership: String,
    grade: String,
    addr_state: String,
    latitude: String,
    longitude: String,
    earliest_cr_line: String,
}

pub fn load_csv(path: &Path) -> Result<Vec<LoanRecord>, LoadError> {
    debug!("reading loans from {}", path.display());
    read_records(csv::Reader::from_path(path)?)
}

pub fn load_from_reader<R: Read>(source: R) -> Result<Vec<LoanRecord>, LoadError> {
    read_records(csv::Reader::from_reader(source))
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<LoanRecord>, LoadError> {
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        records.push(parse_row(index + 1, row)?);
    }

    records.sort_by_key(|record| record.earliest_cr_line);
    info!("loaded {} loan records", records.len());
    Ok(records)
}

fn parse_row(row_number: usize, row: CsvRow) -> Result<LoanRecord, LoadError> {
    Ok(LoanRecord {
        member_id: parse_number(row_number, "member_id", &row.member_id)?,
        loan_amnt: parse_float(row_number, "loan_amnt", &row.loan_amnt)?,
        int_rate: parse_float(
            row_number,
            "int_rate",
            row.int_rate.trim().trim_end_matches('%'),
        )?,
        loan_status: row.loan_status,
        purpose: row.purpose,
        emp_length: row.emp_length,
        home_ownership: row.home_ownership,
        grade: row.grade,
        addr_state: row.addr_state,
        latitude: parse_float(row_number, "latitude", &row.latitude)?,
        longitude: parse_float(row_number, "longitude", &row.longitude)?,
        earliest_cr_line: parse_date(&row.earliest_cr_line).ok_or_else(|| {
            LoadError::InvalidDate {
                row: row_number,
                column: "earliest_cr_line",
                value: row.earliest_cr_line.clone(),
            }
        })?,
    })
}

fn parse_number<T: FromStr>(row: usize, column: &'static str, raw: &str) -> Result<T, LoadError> {
    raw.trim().parse().map_err(|_| LoadError::InvalidNumber {
        row,
        column,
        value: raw.to_string(),
    })
}

// `f64::from_str` also takes `NaN` and `inf`, which are not amounts.
fn parse_float(row: usize, column: &'static str, raw: &str) -> Result<f64, LoadError> {
    let value: f64 = parse_number(row, column, raw)?;
    if !value.is_finite() {
        return Err(LoadError::InvalidNumber {
            row,
            column,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

/// Accepts ISO dates, ISO timestamps, US-style `MM/DD/YYYY` and the
/// month-year form `Jan-2001` (taken as the first of the month).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(timestamp.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Some(date);
    }
    NaiveDate::parse_from_str(&format!("01-{raw}"), "%d-%b-%Y").ok()
}
