//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::RecordFilter;
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Tallyboard - period analytics for marketplace dashboards
///
/// Reads an exported list of records (registrations, businesses, tasks),
/// buckets them into days, weeks or months, and reports per-period counts,
/// growth, breakdowns and a leaderboard as Markdown or JSON.
///
/// Examples:
///   tallyboard --input businesses.json
///   tallyboard --input tasks.json --unit week --count 8 --group-by agent --metric completed
///   tallyboard --input - --reference-date 2024-03-15 --format json < rows.json
///   tallyboard --input rows.json --market Lagos --page 1
///   tallyboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON export to analyze ("-" reads stdin)
    ///
    /// Either an array of rows or an object with a "data" array.
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Date anchoring the newest period (YYYY-MM-DD, default: today in UTC)
    #[arg(short, long, value_name = "DATE", env = "TALLYBOARD_REFERENCE_DATE")]
    pub reference_date: Option<NaiveDate>,

    /// Period unit: day, week or month
    #[arg(short, long, value_name = "UNIT")]
    pub unit: Option<String>,

    /// Number of periods to report
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub count: Option<u32>,

    /// First day of week periods: monday or sunday
    #[arg(long, value_name = "DAY")]
    pub week_start: Option<String>,

    /// Dimension for the breakdown and leaderboard
    ///
    /// Values: market, category, status, task_type, agent
    #[arg(short, long, value_name = "KEY")]
    pub group_by: Option<String>,

    /// Metric the leaderboard is ranked by
    ///
    /// Values: count, completed, completion_rate, sum
    #[arg(long, value_name = "METRIC")]
    pub metric: Option<String>,

    /// Leaderboard size
    #[arg(short, long, value_name = "N")]
    pub top: Option<usize>,

    /// Only include records from this market
    #[arg(long, value_name = "NAME")]
    pub market: Option<String>,

    /// Only include records in this category
    #[arg(long, value_name = "NAME")]
    pub category: Option<String>,

    /// Only include records with this status
    #[arg(long, value_name = "STATUS")]
    pub status: Option<String>,

    /// Only include records owned by this agent
    #[arg(long, value_name = "ID")]
    pub agent: Option<String>,

    /// Include this page (1-based) of the selected records in the report
    #[arg(long, value_name = "PAGE")]
    pub page: Option<usize>,

    /// Records per page (requires --page)
    #[arg(long, value_name = "SIZE", requires = "page")]
    pub page_size: Option<usize>,

    /// Output format (markdown, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tallyboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Parse the input and print record counts per period without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .tallyboard.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// Window, grouping and metric values are checked later when the
    /// engine options are built.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.count == Some(0) {
            return Err("Count must be at least 1".to_string());
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        if self.page == Some(0) {
            return Err("Pages start at 1".to_string());
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        if self.page_size.is_some() && self.page.is_none() {
            return Err("--page-size requires --page".to_string());
        }

        if let Some(ref input) = self.input {
            if input.as_os_str() != crate::input::STDIN_PATH && !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Log filter for the subscriber.
    ///
    /// `rust_log` directives (the `RUST_LOG` variable) apply unless --quiet or
    /// --verbose was given; otherwise the level from [`Args::log_level`] is used.
    pub fn log_filter(&self, rust_log: Option<&str>) -> EnvFilter {
        let builder = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.log_level()).into());

        match rust_log {
            Some(directives) if !self.quiet && !self.verbose => builder.parse_lossy(directives),
            _ => builder.parse_lossy(""),
        }
    }

    /// Record filter from the --market/--category/--status/--agent flags.
    pub fn record_filter(&self) -> RecordFilter {
        RecordFilter {
            market: self.market.clone(),
            category: self.category.clone(),
            status: self.status.clone(),
            agent: self.agent.clone(),
        }
    }

    /// Display name of the input.
    pub fn source_name(&self) -> String {
        match self.input {
            Some(ref path) if path.as_os_str() == crate::input::STDIN_PATH => "stdin".to_string(),
            Some(ref path) => path.display().to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from("-")),
            reference_date: None,
            unit: None,
            count: None,
            week_start: None,
            group_by: None,
            metric: None,
            top: None,
            market: None,
            category: None,
            status: None,
            agent: None,
            page: None,
            page_size: None,
            format: None,
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_accepts_stdin() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input_file() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/no/such/export.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_sizes() {
        let mut args = make_args();
        args.count = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.top = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.page = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_filter_honours_rust_log_unless_overridden() {
        let mut args = make_args();
        assert_eq!(args.log_filter(None).to_string(), "info");
        assert_eq!(
            args.log_filter(Some("tallyboard=trace")).to_string(),
            "tallyboard=trace"
        );
        assert_eq!(args.log_filter(Some("")).to_string(), "info");

        args.quiet = true;
        assert_eq!(args.log_filter(Some("tallyboard=trace")).to_string(), "error");
    }

    #[test]
    fn test_page_size_requires_page() {
        let mut args = make_args();
        args.page_size = Some(10);
        assert!(args.validate().is_err());

        args.page = Some(2);
        assert!(args.validate().is_ok());

        assert!(Args::try_parse_from(["tallyboard", "-i", "-", "--page-size", "10"]).is_err());
        assert!(
            Args::try_parse_from(["tallyboard", "-i", "-", "--page", "1", "--page-size", "10"])
                .is_ok()
        );
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "tallyboard",
            "--input",
            "-",
            "--unit",
            "week",
            "-n",
            "8",
            "--reference-date",
            "2024-03-15",
            "--format",
            "json",
            "--market",
            "Lagos",
        ])
        .unwrap();

        assert_eq!(args.unit.as_deref(), Some("week"));
        assert_eq!(args.count, Some(8));
        assert_eq!(args.reference_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.record_filter().market.as_deref(), Some("Lagos"));
        assert_eq!(args.source_name(), "stdin");
    }

    #[test]
    fn test_input_required_without_init_config() {
        assert!(Args::try_parse_from(["tallyboard"]).is_err());
        assert!(Args::try_parse_from(["tallyboard", "--init-config"]).is_ok());
    }
}
