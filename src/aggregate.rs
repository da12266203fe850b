use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::Datelike;
use log::warn;

use crate::models::{
    EmploymentBreakdown, EmploymentRow, GradeStatusCount, HeadlineMetrics, HomeOwnershipCount,
    InterestRateTrend, LoanPoint, LoanRecord, LoanStatusCount, MonthlyTrend, MonthlyTrendRow,
    PurposeCount, StateSummary, YearlyLoanSummary,
};
use crate::states::state_code;

pub const TOP_PURPOSES: usize = 5;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Default)]
struct AmountStats {
    members: HashSet<u64>,
    sum: f64,
    min: f64,
    max: f64,
    count: usize,
}

impl AmountStats {
    fn add(&mut self, record: &LoanRecord) {
        let amount = record.loan_amnt;
        if self.count == 0 {
            self.min = amount;
            self.max = amount;
        } else {
            self.min = self.min.min(amount);
            self.max = self.max.max(amount);
        }
        self.sum += amount;
        self.count += 1;
        self.members.insert(record.member_id);
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum / self.count as f64).clamp(self.min, self.max)
        }
    }
}

fn distinct_members<K, F>(records: &[LoanRecord], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&LoanRecord) -> K,
{
    let mut groups: BTreeMap<K, HashSet<u64>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().insert(record.member_id);
    }
    groups
        .into_iter()
        .map(|(group, members)| (group, members.len()))
        .collect()
}

pub fn summarize_by_year(records: &[LoanRecord]) -> Vec<YearlyLoanSummary> {
    let mut years: BTreeMap<i32, AmountStats> = BTreeMap::new();
    for record in records {
        years
            .entry(record.earliest_cr_line.year())
            .or_default()
            .add(record);
    }

    years
        .into_iter()
        .map(|(year, stats)| YearlyLoanSummary {
            year,
            loan_sum: stats.sum,
            loan_min: stats.min,
            loan_max: stats.max,
            loan_mean: stats.mean(),
            unique_members: stats.members.len(),
        })
        .collect()
}

pub fn summarize_by_status(records: &[LoanRecord]) -> Vec<LoanStatusCount> {
    distinct_members(records, |record| {
        (record.earliest_cr_line.year(), record.loan_status.clone())
    })
    .into_iter()
    .map(|((year, loan_status), members)| LoanStatusCount {
        year,
        loan_status,
        members,
    })
    .collect()
}

/// Share of `status` among all per-(year, status) member counts, in percent.
/// Returns 0.0 when there is nothing to divide by.
pub fn status_percentage(counts: &[LoanStatusCount], status: &str) -> f64 {
    let total: usize = counts.iter().map(|count| count.members).sum();
    if total == 0 {
        return 0.0;
    }
    let matching: usize = counts
        .iter()
        .filter(|count| count.loan_status == status)
        .map(|count| count.members)
        .sum();
    matching as f64 / total as f64 * 100.0
}

pub fn monthly_trend(records: &[LoanRecord]) -> MonthlyTrend {
    let counts = distinct_members(records, |record| {
        (record.earliest_cr_line.year(), record.earliest_cr_line.month0())
    });
    let years: Vec<i32> = counts
        .keys()
        .map(|(year, _)| *year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(month0, month)| MonthlyTrendRow {
            month: *month,
            members: years
                .iter()
                .map(|year| counts.get(&(*year, month0 as u32)).copied())
                .collect(),
        })
        .collect();

    MonthlyTrend { years, rows }
}

pub fn interest_rate_trend(records: &[LoanRecord]) -> Vec<InterestRateTrend> {
    let mut years: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = years
            .entry(record.earliest_cr_line.year())
            .or_insert((0.0, 0));
        entry.0 += record.int_rate;
        entry.1 += 1;
    }

    years
        .into_iter()
        .map(|(year, (total, count))| InterestRateTrend {
            year,
            int_rate: total / count as f64,
        })
        .collect()
}

pub fn summarize_by_state(records: &[LoanRecord]) -> Vec<StateSummary> {
    let mut states: BTreeMap<&str, AmountStats> = BTreeMap::new();
    for record in records {
        states
            .entry(record.addr_state.as_str())
            .or_default()
            .add(record);
    }

    states
        .into_iter()
        .map(|(name, stats)| {
            let code = state_code(name);
            if code.is_none() {
                warn!("no postal code for state {name:?}, excluded from the map");
            }
            StateSummary {
                addr_state: name.to_string(),
                state_code: code,
                member_count: stats.members.len(),
                max_loan: stats.max,
                min_loan: stats.min,
                mean: stats.mean(),
            }
        })
        .collect()
}

/// Rows that can be joined to a choropleth keyed by postal code.
pub fn choropleth_rows(states: &[StateSummary]) -> Vec<&StateSummary> {
    states
        .iter()
        .filter(|state| state.state_code.is_some())
        .collect()
}

pub fn employment_breakdown(records: &[LoanRecord]) -> EmploymentBreakdown {
    let counts = distinct_members(records, |record| {
        (record.emp_length.clone(), record.loan_status.clone())
    });
    let statuses: Vec<String> = counts
        .keys()
        .map(|(_, status)| status.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut pivot: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for ((emp_length, status), members) in counts {
        let row = pivot
            .entry(emp_length)
            .or_insert_with(|| vec![0; statuses.len()]);
        if let Some(column) = statuses.iter().position(|s| *s == status) {
            row[column] = members;
        }
    }

    let mut rows: Vec<EmploymentRow> = pivot
        .into_iter()
        .map(|(emp_length, members)| EmploymentRow { emp_length, members })
        .collect();
    rows.sort_by_key(|row| std::cmp::Reverse(row.members.iter().sum::<usize>()));

    EmploymentBreakdown { statuses, rows }
}

/// Row counts per (purpose, status) for the `limit` purposes with the most
/// loans, in long form. Equal totals keep purpose name order.
pub fn top_purposes(records: &[LoanRecord], limit: usize) -> Vec<PurposeCount> {
    let mut counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    let mut statuses: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        *counts
            .entry(record.purpose.as_str())
            .or_default()
            .entry(record.loan_status.as_str())
            .or_insert(0) += 1;
        statuses.insert(record.loan_status.as_str());
    }

    let mut ranked: Vec<(&str, BTreeMap<&str, usize>, usize)> = counts
        .into_iter()
        .map(|(purpose, by_status)| {
            let total = by_status.values().sum();
            (purpose, by_status, total)
        })
        .collect();
    ranked.sort_by_key(|(_, _, total)| std::cmp::Reverse(*total));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .flat_map(|(purpose, by_status, _)| {
            statuses
                .iter()
                .map(|status| PurposeCount {
                    purpose: purpose.to_string(),
                    loan_status: status.to_string(),
                    count: by_status.get(status).copied().unwrap_or(0),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn home_ownership_counts(records: &[LoanRecord]) -> Vec<HomeOwnershipCount> {
    distinct_members(records, |record| record.home_ownership.clone())
        .into_iter()
        .map(|(home_ownership, count)| HomeOwnershipCount {
            home_ownership,
            count,
        })
        .collect()
}

pub fn grade_breakdown(records: &[LoanRecord]) -> Vec<GradeStatusCount> {
    distinct_members(records, |record| {
        (record.grade.clone(), record.loan_status.clone())
    })
    .into_iter()
    .map(|((grade, loan_status), members)| GradeStatusCount {
        grade,
        loan_status,
        members,
    })
    .collect()
}

pub fn loan_points(records: &[LoanRecord]) -> Vec<LoanPoint> {
    records
        .iter()
        .map(|record| LoanPoint {
            member_id: record.member_id,
            latitude: record.latitude,
            longitude: record.longitude,
        })
        .collect()
}

pub fn headline_metrics(
    yearly: &[YearlyLoanSummary],
    statuses: &[LoanStatusCount],
    good_status: &str,
    bad_status: &str,
) -> HeadlineMetrics {
    HeadlineMetrics {
        total_members: yearly.iter().map(|year| year.unique_members).sum(),
        total_loan: yearly.iter().map(|year| year.loan_sum).sum(),
        good_loan_percentage: status_percentage(statuses, good_status),
        bad_loan_percentage: status_percentage(statuses, bad_status),
    }
}
