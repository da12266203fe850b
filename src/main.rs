use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;

mod aggregate;
mod error;
mod filter;
mod loader;
mod models;
mod pipeline;
mod report;
mod states;

use filter::DateRange;
use pipeline::StatusLabels;

#[derive(Parser)]
#[command(name = "loan-dashboard")]
#[command(about = "Aggregate views over a consumer loan portfolio", long_about = None)]
struct Cli {
    /// Loan CSV to load, or `-` for stdin
    #[arg(
        long,
        env = "LOAN_DASHBOARD_DATA",
        default_value = "filtered_data.csv",
        global = true
    )]
    data: PathBuf,

    /// Loan status counted as a good loan
    #[arg(long, default_value = "Good Loan", global = true)]
    good_status: String,

    /// Loan status counted as a bad loan
    #[arg(long, default_value = "Bad Loan", global = true)]
    bad_status: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Window {
    /// First credit-line date to include (YYYY-MM-DD), defaults to the earliest
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last credit-line date to include (YYYY-MM-DD), defaults to the latest
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the date bounds of the dataset
    Bounds,
    /// Print headline metrics and the yearly summary
    Summary {
        #[command(flatten)]
        window: Window,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report of every view
    Report {
        #[command(flatten)]
        window: Window,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export every view as JSON
    Export {
        #[command(flatten)]
        window: Window,
        #[arg(long, default_value = "dashboard.json")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let records = if cli.data.as_os_str() == "-" {
        loader::load_from_reader(std::io::stdin().lock()).context("failed to load stdin")?
    } else {
        loader::load_csv(&cli.data)
            .with_context(|| format!("failed to load {}", cli.data.display()))?
    };
    let labels = StatusLabels {
        good: cli.good_status,
        bad: cli.bad_status,
    };

    match cli.command {
        Commands::Bounds => match DateRange::bounds(&records) {
            Some(bounds) => println!(
                "{} loans, credit lines opened {} to {}.",
                records.len(),
                bounds.start,
                bounds.end
            ),
            None => println!("No loans found in {}.", cli.data.display()),
        },
        Commands::Summary { window, limit } => {
            let range = DateRange::select(&records, window.start, window.end)?;
            let dashboard = pipeline::build(&records, range, &labels);
            let metrics = &dashboard.metrics;

            println!("Loans opened {} to {}:", range.start, range.end);
            println!("- Total members: {}", metrics.total_members);
            println!("- Total loaned: {:.2}", metrics.total_loan);
            println!(
                "- Good loans: {}",
                report::format_percentage(metrics.good_loan_percentage)
            );
            println!(
                "- Bad loans: {}",
                report::format_percentage(metrics.bad_loan_percentage)
            );

            if dashboard.yearly.is_empty() {
                println!("No loans found for this window.");
                return Ok(());
            }

            println!("By year:");
            for year in dashboard.yearly.iter().take(limit) {
                println!(
                    "- {}: {} members, {:.2} loaned (mean {:.2})",
                    year.year, year.unique_members, year.loan_sum, year.loan_mean
                );
            }
        }
        Commands::Report { window, out } => {
            let range = DateRange::select(&records, window.start, window.end)?;
            let dashboard = pipeline::build_concurrent(&records, range, &labels).await?;
            std::fs::write(&out, report::build_report(&dashboard))?;
            info!("report covers {} loans", dashboard.record_count);
            println!("Report written to {}.", out.display());
        }
        Commands::Export { window, out } => {
            let range = DateRange::select(&records, window.start, window.end)?;
            let dashboard = pipeline::build_concurrent(&records, range, &labels).await?;
            let json = serde_json::to_string_pretty(&dashboard)
                .context("failed to serialize dashboard")?;
            std::fs::write(&out, json)?;
            println!("Dashboard written to {}.", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_window_dates() {
        let cli = Cli::try_parse_from([
            "loan-dashboard",
            "--data",
            "loans.csv",
            "report",
            "--start",
            "2010-01-01",
            "--end",
            "2012-06-30",
        ])
        .unwrap();

        assert_eq!(cli.data, PathBuf::from("loans.csv"));
        match cli.command {
            Commands::Report { window, out } => {
                assert_eq!(window.start, NaiveDate::from_ymd_opt(2010, 1, 1));
                assert_eq!(window.end, NaiveDate::from_ymd_opt(2012, 6, 30));
                assert_eq!(out, PathBuf::from("report.md"));
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(Cli::try_parse_from(["loan-dashboard", "summary", "--start", "June"]).is_err());
    }
}
