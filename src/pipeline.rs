use std::sync::Arc;

use anyhow::Context;
use log::debug;
use serde::Serialize;

use crate::aggregate::{self, TOP_PURPOSES};
use crate::filter::{filter_by_range, DateRange};
use crate::models::{
    EmploymentBreakdown, GradeStatusCount, HeadlineMetrics, HomeOwnershipCount, InterestRateTrend,
    LoanPoint, LoanRecord, LoanStatusCount, MonthlyTrend, PurposeCount, StateSummary,
    YearlyLoanSummary,
};

/// Loan status labels counted as "good" and "bad" in the headline metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabels {
    pub good: String,
    pub bad: String,
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            good: "Good Loan".to_string(),
            bad: "Bad Loan".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub range: DateRange,
    pub record_count: usize,
    pub metrics: HeadlineMetrics,
    pub yearly: Vec<YearlyLoanSummary>,
    pub statuses: Vec<LoanStatusCount>,
    pub monthly: MonthlyTrend,
    pub interest_rates: Vec<InterestRateTrend>,
    pub states: Vec<StateSummary>,
    pub employment: EmploymentBreakdown,
    pub purposes: Vec<PurposeCount>,
    pub home_ownership: Vec<HomeOwnershipCount>,
    pub grades: Vec<GradeStatusCount>,
    pub points: Vec<LoanPoint>,
}

pub fn build(records: &[LoanRecord], range: DateRange, labels: &StatusLabels) -> Dashboard {
    let filtered = filter_by_range(records, &range);
    debug!(
        "building dashboard for {}..={} over {} records",
        range.start,
        range.end,
        filtered.len()
    );

    let yearly = aggregate::summarize_by_year(&filtered);
    let statuses = aggregate::summarize_by_status(&filtered);
    let metrics = aggregate::headline_metrics(&yearly, &statuses, &labels.good, &labels.bad);

    let dashboard = Dashboard {
        range,
        record_count: filtered.len(),
        metrics,
        yearly,
        statuses,
        monthly: aggregate::monthly_trend(&filtered),
        interest_rates: aggregate::interest_rate_trend(&filtered),
        states: aggregate::summarize_by_state(&filtered),
        employment: aggregate::employment_breakdown(&filtered),
        purposes: aggregate::top_purposes(&filtered, TOP_PURPOSES),
        home_ownership: aggregate::home_ownership_counts(&filtered),
        grades: aggregate::grade_breakdown(&filtered),
        points: aggregate::loan_points(&filtered),
    };
    log_view_sizes(&dashboard);
    dashboard
}

/// Same result as [`build`], with each view computed on a blocking task.
pub async fn build_concurrent(
    records: &[LoanRecord],
    range: DateRange,
    labels: &StatusLabels,
) -> anyhow::Result<Dashboard> {
    let filtered: Arc<[LoanRecord]> = filter_by_range(records, &range).into();
    debug!(
        "building dashboard concurrently for {}..={} over {} records",
        range.start,
        range.end,
        filtered.len()
    );

    macro_rules! spawn_view {
        ($view:expr) => {{
            let data = Arc::clone(&filtered);
            tokio::task::spawn_blocking(move || $view(&data))
        }};
    }

    let (
        yearly,
        statuses,
        monthly,
        interest_rates,
        states,
        employment,
        purposes,
        home,
        grades,
        points,
    ) = tokio::join!(
        spawn_view!(aggregate::summarize_by_year),
        spawn_view!(aggregate::summarize_by_status),
        spawn_view!(aggregate::monthly_trend),
        spawn_view!(aggregate::interest_rate_trend),
        spawn_view!(aggregate::summarize_by_state),
        spawn_view!(aggregate::employment_breakdown),
        spawn_view!(|data: &[LoanRecord]| aggregate::top_purposes(data, TOP_PURPOSES)),
        spawn_view!(aggregate::home_ownership_counts),
        spawn_view!(aggregate::grade_breakdown),
        spawn_view!(aggregate::loan_points),
    );

    let yearly = yearly.context("yearly summary task failed")?;
    let statuses = statuses.context("loan status task failed")?;
    let metrics = aggregate::headline_metrics(&yearly, &statuses, &labels.good, &labels.bad);

    let dashboard = Dashboard {
        range,
        record_count: filtered.len(),
        metrics,
        yearly,
        statuses,
        monthly: monthly.context("monthly trend task failed")?,
        interest_rates: interest_rates.context("interest rate task failed")?,
        states: states.context("state summary task failed")?,
        employment: employment.context("employment breakdown task failed")?,
        purposes: purposes.context("purpose breakdown task failed")?,
        home_ownership: home.context("home ownership task failed")?,
        grades: grades.context("grade breakdown task failed")?,
        points: points.context("loan points task failed")?,
    };
    log_view_sizes(&dashboard);
    Ok(dashboard)
}

fn log_view_sizes(dashboard: &Dashboard) {
    debug!(
        "views: {} years, {} status rows, {} states, {} employment rows, {} purpose rows, {} home ownership rows, {} grade rows",
        dashboard.yearly.len(),
        dashboard.statuses.len(),
        dashboard.states.len(),
        dashboard.employment.rows.len(),
        dashboard.purposes.len(),
        dashboard.home_ownership.len(),
        dashboard.grades.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{date, record};
    use pretty_assertions::assert_eq;

    fn portfolio() -> Vec<LoanRecord> {
        vec![
            LoanRecord {
                loan_amnt: 1000.0,
                ..record(1, date(2015, 2, 10))
            },
            LoanRecord {
                loan_amnt: 2000.0,
                loan_status: "Bad Loan".to_string(),
                purpose: "car".to_string(),
                addr_state: "Ohio".to_string(),
                ..record(2, date(2015, 8, 3))
            },
            LoanRecord {
                loan_amnt: 1500.0,
                emp_length: "5 years".to_string(),
                ..record(1, date(2016, 2, 1))
            },
            LoanRecord {
                loan_amnt: 800.0,
                addr_state: "Guam".to_string(),
                ..record(4, date(2018, 11, 20))
            },
        ]
    }

    #[test]
    fn builds_every_view_for_the_selected_range() {
        let records = portfolio();
        let range = DateRange::select(&records, None, Some(date(2016, 12, 31))).unwrap();
        let dashboard = build(&records, range, &StatusLabels::default());

        assert_eq!(dashboard.record_count, 3);
        assert_eq!(dashboard.metrics.total_members, 3);
        assert_eq!(dashboard.metrics.total_loan, 4500.0);
        assert_eq!(
            format!("{:.2}", dashboard.metrics.good_loan_percentage),
            "66.67"
        );
        assert_eq!(dashboard.monthly.years, vec![2015, 2016]);
        assert_eq!(dashboard.states.len(), 2);
        assert_eq!(dashboard.points.len(), 3);
    }

    #[test]
    fn rebuilding_is_deterministic() {
        let records = portfolio();
        let range = DateRange::bounds(&records).unwrap();
        let labels = StatusLabels::default();

        assert_eq!(
            build(&records, range, &labels),
            build(&records, range, &labels)
        );
    }

    #[test]
    fn empty_range_yields_empty_views() {
        let records = portfolio();
        let range = DateRange {
            start: date(2017, 1, 1),
            end: date(2017, 12, 31),
        };
        let dashboard = build(&records, range, &StatusLabels::default());

        assert_eq!(dashboard.record_count, 0);
        assert!(dashboard.yearly.is_empty());
        assert_eq!(dashboard.metrics.good_loan_percentage, 0.0);
        assert_eq!(dashboard.metrics.bad_loan_percentage, 0.0);
        assert_eq!(dashboard.monthly.rows.len(), 12);
    }

    #[test]
    fn headline_metrics_follow_configured_labels() {
        let mut records = portfolio();
        records.push(LoanRecord {
            loan_status: "Current".to_string(),
            ..record(5, date(2016, 3, 1))
        });
        let range = DateRange::bounds(&records).unwrap();
        let labels = StatusLabels {
            good: "Current".to_string(),
            bad: "Good Loan".to_string(),
        };
        let dashboard = build(&records, range, &labels);

        assert_eq!(format!("{:.2}", dashboard.metrics.good_loan_percentage), "20.00");
        assert_eq!(format!("{:.2}", dashboard.metrics.bad_loan_percentage), "60.00");
    }

    #[test]
    fn exported_json_keeps_nulls_for_missing_values() {
        let records = portfolio();
        let range = DateRange::bounds(&records).unwrap();
        let dashboard = build(&records, range, &StatusLabels::default());

        let json = serde_json::to_string_pretty(&dashboard).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["range"]["start"], "2015-02-10");
        assert_eq!(value["record_count"], 4);
        assert_eq!(value["monthly"]["years"], serde_json::json!([2015, 2016, 2018]));
        assert_eq!(value["monthly"]["rows"][1]["month"], "February");
        assert_eq!(
            value["monthly"]["rows"][1]["members"],
            serde_json::json!([1, 1, null])
        );

        let states = value["states"].as_array().unwrap();
        let guam = states
            .iter()
            .find(|state| state["addr_state"] == "Guam")
            .unwrap();
        assert!(guam["state_code"].is_null());
        assert_eq!(states.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_build_matches_sequential() {
        let records = portfolio();
        let range = DateRange::bounds(&records).unwrap();
        let labels = StatusLabels::default();

        let concurrent = build_concurrent(&records, range, &labels).await.unwrap();
        assert_eq!(concurrent, build(&records, range, &labels));
    }
}
