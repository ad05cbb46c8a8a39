//! Tallyboard - period analytics for marketplace dashboards
//!
//! A CLI tool that reads exported marketplace records and reports
//! per-period counts, growth, breakdowns and leaderboards.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments or configuration, unreadable input, write failure

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tallyboard::analysis::{self, AnalyticsOptions};
use tallyboard::cli::{Args, OutputFormat};
use tallyboard::config::{Config, CONFIG_FILE};
use tallyboard::input::{self, LoadedRecords};
use tallyboard::report;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    info!("Tallyboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_report(&args) {
        error!("Report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .tallyboard.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to change the window, grouping, metric and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings and `RUST_LOG`.
///
/// Logs go to stderr so a report written to stdout stays clean.
fn init_logging(args: &Args) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = args.log_filter(rust_log.as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load, aggregate and write the report.
fn run_report(args: &Args) -> Result<()> {
    // Load configuration
    let mut config = load_config(args)?;
    config.merge_with_args(args);

    let reference_date = args
        .reference_date
        .unwrap_or_else(|| Utc::now().date_naive());

    // Invalid window/grouping settings fail here, before any input is read
    let mut options =
        config.analytics_options(reference_date, args.record_filter(), args.page)?;
    options.source = args.source_name();

    let input_path = args.input.clone().unwrap_or_else(|| PathBuf::from("-"));
    info!("Reading records from {}", options.source);
    let loaded = input::load_records(&input_path)?;
    info!(
        "Loaded {} records ({} rows rejected)",
        loaded.records.len(),
        loaded.rejected.len()
    );

    if args.dry_run {
        return handle_dry_run(&loaded, &options);
    }

    let mut analytics = analysis::run(&loaded.records, &options)?;
    for rejected in &loaded.rejected {
        analytics
            .warnings
            .push(format!("Rejected malformed {}", rejected));
    }

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&analytics)?,
        OutputFormat::Markdown => report::generate_markdown_report(&analytics, &config.report),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            print_summary(&analytics);
            println!("\n✅ Report saved to: {}", path.display());
        }
        None => print!("{}", output),
    }

    if !analytics.warnings.is_empty() {
        warn!("{} data-quality warning(s) in report", analytics.warnings.len());
    }

    Ok(())
}

/// Print a short summary after writing the report to a file.
fn print_summary(analytics: &tallyboard::models::AnalyticsReport) {
    let metadata = &analytics.metadata;
    println!("\n📊 Analytics Summary:");
    println!(
        "   Window: {} × {} ending {}",
        metadata.window_count, metadata.window_unit, metadata.reference_date
    );
    println!(
        "   Records: {} read | {} in span | {} skipped",
        metadata.records_read, metadata.records_in_span, metadata.records_skipped
    );
    if let Some(ref growth) = analytics.growth {
        println!(
            "   {} vs {}: {:+.1}% ({})",
            growth.current_label, growth.previous_label, growth.total.value, growth.total.direction
        );
    }
    if let Some(leader) = analytics.ranked_list.first() {
        println!("   Top {}: {} ({})", analytics.group_by, leader.name, leader.value);
    }
}

/// Handle --dry-run: bucket the records, print counts per period, exit.
fn handle_dry_run(loaded: &LoadedRecords, options: &AnalyticsOptions) -> Result<()> {
    println!("\n🔍 Dry run: bucketing records (no report written)...\n");

    let selected = analysis::filter_records(&loaded.records, &options.filter);
    let bucketing = analysis::bucketize_refs(
        selected.iter().copied(),
        options.reference_date,
        &options.window,
    );

    for bucket in &bucketing.buckets {
        println!(
            "   📅 {:<16} {} → {}  {:>6} records",
            bucket.period.label,
            bucket.period.start,
            bucket.period.last_day(),
            bucket.count()
        );
    }

    println!(
        "\n   Rows: {} | selected: {} | in span: {} | outside span: {} | bad timestamp: {} | rejected: {}",
        loaded.rows_seen(),
        selected.len(),
        bucketing.in_span(),
        bucketing.out_of_span,
        bucketing.skipped,
        loaded.rejected.len()
    );

    println!("\n✅ Dry run complete.");
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// A config file that is present but malformed fails the run.
fn load_config(args: &Args) -> Result<Config> {
    match args.config {
        Some(ref config_path) => info!("Loading config from: {}", config_path.display()),
        None if Path::new(CONFIG_FILE).exists() => info!("Loading default config from {}", CONFIG_FILE),
        None => debug!("No config file found, using defaults"),
    }

    Config::load_for_run(args.config.as_deref(), Path::new("."))
}
