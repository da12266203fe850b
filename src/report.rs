use std::fmt::Write;

use crate::aggregate::choropleth_rows;
use crate::pipeline::Dashboard;

pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}

pub fn build_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();
    let metrics = &dashboard.metrics;

    let _ = writeln!(output, "# Loan Dashboard");
    let _ = writeln!(
        output,
        "Credit lines opened {} to {} ({} loans)",
        dashboard.range.start, dashboard.range.end, dashboard.record_count
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headline");
    let _ = writeln!(output, "- Total members: {}", metrics.total_members);
    let _ = writeln!(output, "- Total loaned: {:.2}", metrics.total_loan);
    let _ = writeln!(
        output,
        "- Good loans: {}",
        format_percentage(metrics.good_loan_percentage)
    );
    let _ = writeln!(
        output,
        "- Bad loans: {}",
        format_percentage(metrics.bad_loan_percentage)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Yearly Loans");
    if dashboard.yearly.is_empty() {
        let _ = writeln!(output, "No loans in this window.");
    } else {
        let _ = writeln!(output, "| Year | Members | Sum | Min | Max | Mean |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for year in &dashboard.yearly {
            let _ = writeln!(
                output,
                "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} |",
                year.year,
                year.unique_members,
                year.loan_sum,
                year.loan_min,
                year.loan_max,
                year.loan_mean
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Members");
    if dashboard.monthly.years.is_empty() {
        let _ = writeln!(output, "No loans in this window.");
    } else {
        let years: Vec<String> = dashboard
            .monthly
            .years
            .iter()
            .map(|year| year.to_string())
            .collect();
        let _ = writeln!(output, "| Month | {} |", years.join(" | "));
        let _ = writeln!(output, "|---|{}", "---|".repeat(years.len()));
        for row in &dashboard.monthly.rows {
            let cells: Vec<String> = row
                .members
                .iter()
                .map(|cell| cell.map(|count| count.to_string()).unwrap_or_default())
                .collect();
            let _ = writeln!(output, "| {} | {} |", row.month, cells.join(" | "));
        }
        let _ = writeln!(output);
        for series in dashboard.monthly.series() {
            let peak = series
                .points
                .iter()
                .filter_map(|(month, count)| count.map(|count| (*month, count)))
                .max_by_key(|(_, count)| *count);
            if let Some((month, count)) = peak {
                let _ = writeln!(
                    output,
                    "- {} peaked in {} with {} members",
                    series.year, month, count
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Interest Rate");
    if dashboard.interest_rates.is_empty() {
        let _ = writeln!(output, "No loans in this window.");
    } else {
        for trend in &dashboard.interest_rates {
            let _ = writeln!(output, "- {}: {:.2}%", trend.year, trend.int_rate);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## States");
    let mapped = choropleth_rows(&dashboard.states);
    if mapped.is_empty() {
        let _ = writeln!(output, "No mapped states in this window.");
    } else {
        for state in mapped {
            let _ = writeln!(
                output,
                "- {} ({}): {} members, loans {:.2} to {:.2} (mean {:.2})",
                state.addr_state,
                state.state_code.unwrap_or_default(),
                state.member_count,
                state.min_loan,
                state.max_loan,
                state.mean
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Employment Length");
    if dashboard.employment.rows.is_empty() {
        let _ = writeln!(output, "No loans in this window.");
    } else {
        let _ = writeln!(
            output,
            "| Employment | {} |",
            dashboard.employment.statuses.join(" | ")
        );
        let _ = writeln!(
            output,
            "|---|{}",
            "---|".repeat(dashboard.employment.statuses.len())
        );
        for row in &dashboard.employment.rows {
            let cells: Vec<String> = row.members.iter().map(|c| c.to_string()).collect();
            let _ = writeln!(output, "| {} | {} |", row.emp_length, cells.join(" | "));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Purposes");
    if dashboard.purposes.is_empty() {
        let _ = writeln!(output, "No loans in this window.");
    } else {
        for purpose in &dashboard.purposes {
            let _ = writeln!(
                output,
                "- {} / {}: {}",
                purpose.purpose, purpose.loan_status, purpose.count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Home Ownership");
    if dashboard.home_ownership.is_empty() {
        let _ = writeln!(output, "No loans in this window.");
    } else {
        for home in &dashboard.home_ownership {
            let _ = writeln!(output, "- {}: {} members", home.home_ownership, home.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grades");
    if dashboard.grades.is_empty() {
        let _ = writeln!(output, "No loans in this window.");
    } else {
        for grade in &dashboard.grades {
            let _ = writeln!(
                output,
                "- {} / {}: {} members",
                grade.grade, grade.loan_status, grade.members
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{date, record};
    use crate::filter::DateRange;
    use crate::models::LoanRecord;
    use crate::pipeline::{build, StatusLabels};

    #[test]
    fn percentages_render_with_two_decimals() {
        assert_eq!(format_percentage(200.0 / 3.0), "66.67%");
        assert_eq!(format_percentage(0.0), "0.00%");
    }

    #[test]
    fn report_lists_views_and_skips_unmapped_states() {
        let records = vec![
            record(1, date(2014, 5, 1)),
            LoanRecord {
                addr_state: "Atlantis".to_string(),
                ..record(2, date(2015, 7, 1))
            },
        ];
        let range = DateRange::bounds(&records).unwrap();
        let report = build_report(&build(&records, range, &StatusLabels::default()));

        assert!(report.contains("Credit lines opened 2014-05-01 to 2015-07-01 (2 loans)"));
        assert!(report.contains("- Good loans: 100.00%"));
        assert!(report.contains("| Month | 2014 | 2015 |"));
        assert!(report.contains("| May | 1 |  |"));
        assert!(report.contains("- 2015 peaked in July with 1 members"));
        assert!(report.contains("- Texas (TX): 1 members"));
        assert!(!report.contains("Atlantis"));
    }

    #[test]
    fn empty_window_renders_placeholders() {
        let records = vec![record(1, date(2014, 5, 1)), record(2, date(2016, 5, 1))];
        let range = DateRange {
            start: date(2015, 1, 1),
            end: date(2015, 12, 31),
        };
        let report = build_report(&build(&records, range, &StatusLabels::default()));

        assert!(report.contains("- Good loans: 0.00%"));
        assert!(report.contains("No loans in this window."));
        assert!(report.contains("No mapped states in this window."));
    }
}
