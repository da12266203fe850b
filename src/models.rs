use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanRecord {
    pub member_id: u64,
    pub loan_amnt: f64,
    pub int_rate: f64,
    pub loan_status: String,
    pub purpose: String,
    pub emp_length: String,
    pub home_ownership: String,
    pub grade: String,
    pub addr_state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub earliest_cr_line: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyLoanSummary {
    pub year: i32,
    pub loan_sum: f64,
    pub loan_min: f64,
    pub loan_max: f64,
    pub loan_mean: f64,
    pub unique_members: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanStatusCount {
    pub year: i32,
    pub loan_status: String,
    pub members: usize,
}

/// Distinct members per calendar month, one column per year.
///
/// `rows` always holds the twelve months in calendar order. A `None` cell
/// means no record exists for that (year, month) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub years: Vec<i32>,
    pub rows: Vec<MonthlyTrendRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrendRow {
    pub month: &'static str,
    pub members: Vec<Option<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub year: i32,
    pub points: Vec<(&'static str, Option<usize>)>,
}

impl MonthlyTrend {
    /// Splits the table into one plottable series per year column.
    pub fn series(&self) -> Vec<TrendSeries> {
        self.years
            .iter()
            .enumerate()
            .map(|(column, year)| TrendSeries {
                year: *year,
                points: self
                    .rows
                    .iter()
                    .map(|row| (row.month, row.members.get(column).copied().flatten()))
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterestRateTrend {
    pub year: i32,
    pub int_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub addr_state: String,
    pub state_code: Option<&'static str>,
    pub member_count: usize,
    pub max_loan: f64,
    pub min_loan: f64,
    pub mean: f64,
}

/// Wide table of distinct members per employment length and loan status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmploymentBreakdown {
    pub statuses: Vec<String>,
    pub rows: Vec<EmploymentRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmploymentRow {
    pub emp_length: String,
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurposeCount {
    pub purpose: String,
    pub loan_status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeOwnershipCount {
    pub home_ownership: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeStatusCount {
    pub grade: String,
    pub loan_status: String,
    pub members: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanPoint {
    pub member_id: u64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub total_members: usize,
    pub total_loan: f64,
    pub good_loan_percentage: f64,
    pub bad_loan_percentage: f64,
}
