//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tallyboard.toml` files.

use crate::analysis::{AnalyticsOptions, PageRequest, RecordFilter};
use crate::cli::{Args, OutputFormat};
use crate::error::AnalyticsError;
use crate::models::{GroupKey, Metric, WeekStart, WindowSpec, WindowUnit};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".tallyboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Reporting window settings.
    #[serde(default)]
    pub window: WindowConfig,

    /// Breakdown and leaderboard settings.
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Reporting window settings.
///
/// Kept as text so that bad values surface as descriptive analytics errors
/// rather than TOML type errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Period unit: day, week or month.
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Number of periods.
    #[serde(default = "default_count")]
    pub count: u32,

    /// First day of week periods: monday or sunday.
    #[serde(default = "default_week_start")]
    pub week_start: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            count: default_count(),
            week_start: default_week_start(),
        }
    }
}

fn default_unit() -> String {
    WindowUnit::Month.to_string()
}

fn default_count() -> u32 {
    6
}

fn default_week_start() -> String {
    WeekStart::Monday.to_string()
}

/// Breakdown and leaderboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Dimension to group by.
    #[serde(default = "default_group_by")]
    pub group_by: String,

    /// Metric to rank groups by.
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Leaderboard size.
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            group_by: default_group_by(),
            metric: default_metric(),
            top: default_top(),
        }
    }
}

fn default_group_by() -> String {
    GroupKey::Market.to_string()
}

fn default_metric() -> String {
    Metric::Count.to_string()
}

fn default_top() -> usize {
    5
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the chart series table in Markdown reports.
    #[serde(default = "default_true")]
    pub include_series: bool,

    /// Include data-quality warnings in Markdown reports.
    #[serde(default = "default_true")]
    pub include_warnings: bool,

    /// Records per page when a page is requested.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_series: true,
            include_warnings: true,
            page_size: default_page_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    20
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Configuration for a run: the explicit file when given, otherwise the
    /// default file in `dir`, otherwise defaults.
    ///
    /// A config file that exists but cannot be read or parsed is an error,
    /// never a silent fallback to defaults.
    pub fn load_for_run(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_from_dir(dir)?.unwrap_or_default()),
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if let Some(ref unit) = args.unit {
            self.window.unit = unit.clone();
        }
        if let Some(count) = args.count {
            self.window.count = count;
        }
        if let Some(ref week_start) = args.week_start {
            self.window.week_start = week_start.clone();
        }

        if let Some(ref group_by) = args.group_by {
            self.ranking.group_by = group_by.clone();
        }
        if let Some(ref metric) = args.metric {
            self.ranking.metric = metric.clone();
        }
        if let Some(top) = args.top {
            self.ranking.top = top;
        }

        if let Some(page_size) = args.page_size {
            self.report.page_size = page_size;
        }
    }

    /// Validated window from the window section.
    pub fn window_spec(&self) -> std::result::Result<WindowSpec, AnalyticsError> {
        let week_start = self.window.week_start.parse::<WeekStart>()?;
        Ok(WindowSpec::parse(self.window.count, &self.window.unit)?.with_week_start(week_start))
    }

    /// Build engine options. Fails on the first invalid setting.
    pub fn analytics_options(
        &self,
        reference_date: NaiveDate,
        filter: RecordFilter,
        page: Option<usize>,
    ) -> std::result::Result<AnalyticsOptions, AnalyticsError> {
        let mut options = AnalyticsOptions::new(reference_date, self.window_spec()?);
        options.group_by = self.ranking.group_by.parse()?;
        options.metric = self.ranking.metric.parse()?;
        options.top = self.ranking.top;
        options.filter = filter;
        options.page = page.map(|page| PageRequest {
            page,
            page_size: self.report.page_size,
        });
        options.validate()?;
        Ok(options)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
