//! Data models for the analytics engine.
//!
//! This module contains the record shape exported by the data store, the
//! window and selector enums that configure an aggregation run, and the
//! result structures handed to report rendering.

use crate::error::AnalyticsError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A timestamped fact exported from the data store (a registration, a
/// business, a task).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Row identifier. Numeric ids are read as text.
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// Creation instant as ISO-8601 text. Parsed lazily so that a bad row
    /// can be skipped instead of failing the whole load.
    #[serde(alias = "createdAt")]
    pub created_at: String,
    /// Owning agent. Numeric foreign keys are read as text.
    #[serde(
        default,
        alias = "agentId",
        alias = "owner_id",
        alias = "ownerId",
        deserialize_with = "lenient_text"
    )]
    pub agent_id: Option<String>,
    /// Market the record belongs to.
    #[serde(default, alias = "marketName", deserialize_with = "lenient_text")]
    pub market_name: Option<String>,
    /// Category title.
    #[serde(default, alias = "categoryName", deserialize_with = "lenient_text")]
    pub category_name: Option<String>,
    /// Workflow status.
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    /// Task type, for task rows.
    #[serde(default, alias = "taskType", deserialize_with = "lenient_text")]
    pub task_type: Option<String>,
    /// Explicit completion flag.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub completed: Option<bool>,
    /// Numeric value summed by aggregation (price, payout).
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

// Optional fields never reject a row: scalars of the wrong type are
// converted where the meaning is clear, anything else reads as missing.

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Some(Value::String(text)) => match text.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

impl Record {
    /// Creates a record with only the required fields set.
    pub fn new(id: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: created_at.into(),
            ..Default::default()
        }
    }

    /// Completion flag: the explicit field wins, otherwise the status decides.
    pub fn is_completed(&self) -> Option<bool> {
        if let Some(flag) = self.completed {
            return Some(flag);
        }

        let status = self.status.as_deref()?.trim();
        if status.is_empty() {
            return None;
        }

        match status.to_lowercase().as_str() {
            "completed" | "complete" | "done" | "approved" | "active" => Some(true),
            _ => Some(false),
        }
    }

    /// Value of a grouping dimension. Blank strings count as missing.
    pub fn group_value(&self, key: GroupKey) -> Option<&str> {
        let value = match key {
            GroupKey::Market => self.market_name.as_deref(),
            GroupKey::Category => self.category_name.as_deref(),
            GroupKey::Status => self.status.as_deref(),
            GroupKey::TaskType => self.task_type.as_deref(),
            GroupKey::Agent => self.agent_id.as_deref(),
        }?;

        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Unit of a reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowUnit {
    Day,
    Week,
    #[default]
    Month,
}

impl WindowUnit {
    /// Longest window accepted for this unit, about a century of months or
    /// weeks and ten years of days.
    pub fn max_count(&self) -> u32 {
        match self {
            WindowUnit::Day => 3_660,
            WindowUnit::Week => 5_218,
            WindowUnit::Month => 1_200,
        }
    }
}

impl fmt::Display for WindowUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowUnit::Day => write!(f, "day"),
            WindowUnit::Week => write!(f, "week"),
            WindowUnit::Month => write!(f, "month"),
        }
    }
}

impl FromStr for WindowUnit {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "days" | "daily" => Ok(WindowUnit::Day),
            "week" | "weeks" | "weekly" => Ok(WindowUnit::Week),
            "month" | "months" | "monthly" => Ok(WindowUnit::Month),
            other => Err(AnalyticsError::UnknownWindowUnit(other.to_string())),
        }
    }
}

/// First day of a calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Monday => write!(f, "monday"),
            WeekStart::Sunday => write!(f, "sunday"),
        }
    }
}

impl FromStr for WeekStart {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(WeekStart::Monday),
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            other => Err(AnalyticsError::UnknownWeekStart(other.to_string())),
        }
    }
}

/// A validated window: how many periods of which unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    count: u32,
    unit: WindowUnit,
    week_start: WeekStart,
}

impl WindowSpec {
    /// Builds a window, rejecting a zero count and counts past
    /// [`WindowUnit::max_count`]. Weeks start on Monday.
    pub fn new(count: u32, unit: WindowUnit) -> Result<Self, AnalyticsError> {
        if count == 0 {
            return Err(AnalyticsError::InvalidWindowCount(count));
        }
        if count > unit.max_count() {
            return Err(AnalyticsError::WindowTooLong {
                count,
                unit,
                max: unit.max_count(),
            });
        }
        Ok(Self {
            count,
            unit,
            week_start: WeekStart::default(),
        })
    }

    /// Sets the first day of week buckets.
    pub fn with_week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }

    /// Builds a window from a textual unit such as `"week"`.
    pub fn parse(count: u32, unit: &str) -> Result<Self, AnalyticsError> {
        let unit = unit.parse::<WindowUnit>()?;
        Self::new(count, unit)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn unit(&self) -> WindowUnit {
        self.unit
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }
}

/// A contiguous reporting interval `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// First day in the period.
    pub start: NaiveDate,
    /// First day after the period.
    pub end: NaiveDate,
    /// Steps back from the reference period (0 = the reference period).
    pub offset: u32,
    /// Display label ("Mar 2024", "Week of Mar 11", "Mar 15").
    pub label: String,
}

impl Period {
    /// Last calendar day covered by the period.
    pub fn last_day(&self) -> NaiveDate {
        self.end - Duration::days(1)
    }

    /// Whether a calendar day falls inside the period.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// A record together with its parsed creation instant.
#[derive(Debug, Clone, Copy)]
pub struct TimedRecord<'a> {
    pub record: &'a Record,
    pub created_at: DateTime<Utc>,
}

/// A period and the records that fall inside it.
#[derive(Debug, Clone)]
pub struct Bucket<'a> {
    pub period: Period,
    pub records: Vec<TimedRecord<'a>>,
}

impl<'a> Bucket<'a> {
    /// Creates an empty bucket for a period.
    pub fn empty(period: Period) -> Self {
        Self {
            period,
            records: Vec::new(),
        }
    }

    /// Number of records in the bucket.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// The bucket's records without their parsed timestamps.
    pub fn rows(&self) -> Vec<&'a Record> {
        self.records.iter().map(|r| r.record).collect()
    }
}

/// Categorical dimension used for grouping and ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    #[default]
    Market,
    Category,
    Status,
    TaskType,
    Agent,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Market => write!(f, "market"),
            GroupKey::Category => write!(f, "category"),
            GroupKey::Status => write!(f, "status"),
            GroupKey::TaskType => write!(f, "task_type"),
            GroupKey::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for GroupKey {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "market" | "market_name" | "marketname" => Ok(GroupKey::Market),
            "category" | "category_name" | "categoryname" => Ok(GroupKey::Category),
            "status" => Ok(GroupKey::Status),
            "task_type" | "tasktype" | "type" => Ok(GroupKey::TaskType),
            "agent" | "agent_id" | "agentid" | "owner" => Ok(GroupKey::Agent),
            other => Err(AnalyticsError::UnknownGroupKey(other.to_string())),
        }
    }
}

/// Metric used to rank groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Count,
    Completed,
    CompletionRate,
    Sum,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Count => write!(f, "count"),
            Metric::Completed => write!(f, "completed"),
            Metric::CompletionRate => write!(f, "completion_rate"),
            Metric::Sum => write!(f, "sum"),
        }
    }
}

impl FromStr for Metric {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "count" | "total" => Ok(Metric::Count),
            "completed" => Ok(Metric::Completed),
            "completion_rate" | "rate" => Ok(Metric::CompletionRate),
            "sum" | "amount" => Ok(Metric::Sum),
            other => Err(AnalyticsError::UnknownMetric(other.to_string())),
        }
    }
}

/// Counts for one bucket or group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetric {
    /// Number of records.
    pub total: usize,
    /// Completed records, when any record carries a completion flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<usize>,
    /// `total - completed`, when completion is tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<usize>,
    /// Sum of record amounts.
    pub sum: f64,
}

impl AggregateMetric {
    /// Completion rate in percent, 0 when nothing is tracked or the bucket is empty.
    pub fn rate(&self) -> f64 {
        crate::analysis::rate(self.completed.unwrap_or(0), self.total)
    }

    /// Whether completed/pending are tracked.
    pub fn tracks_completion(&self) -> bool {
        self.completed.is_some()
    }

    /// Reads a metric value for ranking.
    pub fn value_of(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Count => self.total as f64,
            Metric::Completed => self.completed.unwrap_or(0) as f64,
            Metric::CompletionRate => self.rate(),
            Metric::Sum => self.sum,
        }
    }
}

/// Direction of a period-over-period change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    /// Arrow used in rendered reports.
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
            Direction::Flat => "▬",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Flat => write!(f, "flat"),
        }
    }
}

/// Percentage change between two adjacent periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    pub value: f64,
    pub direction: Direction,
}

/// An entity paired with the value it is ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub name: String,
    pub value: f64,
}

impl RankedEntity {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Record count for one value of a grouping dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    pub count: usize,
}

/// Chart-ready series: one label per period, one value per label in each series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub series: BTreeMap<String, Vec<f64>>,
}

/// One page of selected items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Summary of one bucket in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub period: Period,
    pub metric: AggregateMetric,
    /// Completion rate in percent.
    pub completion_rate: f64,
}

/// Growth of the newest period against the one before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSummary {
    /// Label of the newest period.
    pub current_label: String,
    /// Label of the period compared against.
    pub previous_label: String,
    /// Change in record count.
    pub total: Growth,
    /// Change in completed records, when completion is tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<Growth>,
}

/// Metadata about an analytics run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the records came from.
    pub source: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Date anchoring the newest period.
    pub reference_date: NaiveDate,
    pub window_unit: WindowUnit,
    pub window_count: u32,
    /// First day of the oldest period.
    pub span_start: NaiveDate,
    /// First day after the newest period.
    pub span_end: NaiveDate,
    /// Records handed to the engine.
    pub records_read: usize,
    /// Records left after filtering.
    pub records_selected: usize,
    /// Records that landed in a bucket.
    pub records_in_span: usize,
    /// Records with a valid timestamp outside the span.
    pub records_out_of_span: usize,
    /// Records skipped because their timestamp could not be parsed.
    pub records_skipped: usize,
}

/// The complete analytics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub metadata: ReportMetadata,
    /// Per-period summaries, oldest first.
    pub buckets: Vec<BucketSummary>,
    /// Chart labels and series.
    #[serde(flatten)]
    pub chart: ChartSeries,
    /// Newest period against the previous one. Absent with a single period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth: Option<GrowthSummary>,
    /// Dimension used for the breakdown and ranking.
    pub group_by: GroupKey,
    /// Metric used for the ranking.
    pub metric: Metric,
    /// Span-wide record counts per group, largest first.
    pub breakdown: Vec<GroupCount>,
    /// Leaderboard.
    pub ranked_list: Vec<RankedEntity>,
    /// Data-quality warnings.
    pub warnings: Vec<String>,
    /// Requested page of selected records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<Page<Record>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accepts_camel_case_fields() {
        let json = r#"{
            "id": "b-1",
            "createdAt": "2024-03-15T10:00:00Z",
            "marketName": "Lagos",
            "categoryName": null,
            "agentId": "agent-7"
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.created_at, "2024-03-15T10:00:00Z");
        assert_eq!(record.market_name.as_deref(), Some("Lagos"));
        assert_eq!(record.category_name, None);
        assert_eq!(record.agent_id.as_deref(), Some("agent-7"));
        assert_eq!(record.completed, None);
    }

    #[test]
    fn test_record_numeric_id() {
        let record: Record =
            serde_json::from_str(r#"{"id": 42, "created_at": "2024-01-01"}"#).unwrap();
        assert_eq!(record.id, "42");
    }

    #[test]
    fn test_is_completed_prefers_explicit_flag() {
        let mut record = Record::new("t-1", "2024-01-01");
        assert_eq!(record.is_completed(), None);

        record.status = Some("Done".to_string());
        assert_eq!(record.is_completed(), Some(true));

        record.status = Some("in_progress".to_string());
        assert_eq!(record.is_completed(), Some(false));

        record.completed = Some(true);
        assert_eq!(record.is_completed(), Some(true));
    }

    #[test]
    fn test_group_value_treats_blank_as_missing() {
        let mut record = Record::new("r", "2024-01-01");
        record.market_name = Some("   ".to_string());
        assert_eq!(record.group_value(GroupKey::Market), None);

        record.market_name = Some(" Accra ".to_string());
        assert_eq!(record.group_value(GroupKey::Market), Some("Accra"));
    }

    #[test]
    fn test_window_spec_validation() {
        assert!(WindowSpec::new(0, WindowUnit::Week).is_err());
        assert_eq!(
            WindowSpec::parse(3, "fortnight"),
            Err(AnalyticsError::UnknownWindowUnit("fortnight".to_string()))
        );

        let spec = WindowSpec::parse(4, "Weekly").unwrap();
        assert_eq!(spec.count(), 4);
        assert_eq!(spec.unit(), WindowUnit::Week);
    }

    #[test]
    fn test_window_spec_rejects_oversized_counts() {
        assert!(WindowSpec::new(1_200, WindowUnit::Month).is_ok());
        assert_eq!(
            WindowSpec::new(4_000_000, WindowUnit::Month),
            Err(AnalyticsError::WindowTooLong {
                count: 4_000_000,
                unit: WindowUnit::Month,
                max: 1_200,
            })
        );
        assert!(WindowSpec::new(3_661, WindowUnit::Day).is_err());
        assert!(WindowSpec::new(u32::MAX, WindowUnit::Week).is_err());
    }

    #[test]
    fn test_selectors_from_str() {
        assert_eq!("task-type".parse::<GroupKey>().unwrap(), GroupKey::TaskType);
        assert_eq!("marketName".parse::<GroupKey>().unwrap(), GroupKey::Market);
        assert!("colour".parse::<GroupKey>().is_err());
        assert_eq!("rate".parse::<Metric>().unwrap(), Metric::CompletionRate);
        assert_eq!("SUN".parse::<WeekStart>().unwrap(), WeekStart::Sunday);
    }

    #[test]
    fn test_period_bounds() {
        let period = Period {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            offset: 1,
            label: "Feb 2024".to_string(),
        };

        assert_eq!(period.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(period.days(), 29);
        assert!(period.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }

    #[test]
    fn test_aggregate_metric_value_of() {
        let metric = AggregateMetric {
            total: 10,
            completed: Some(7),
            pending: Some(3),
            sum: 125.5,
        };

        assert_eq!(metric.value_of(Metric::Count), 10.0);
        assert_eq!(metric.value_of(Metric::Completed), 7.0);
        assert_eq!(metric.value_of(Metric::CompletionRate), 70.0);
        assert_eq!(metric.value_of(Metric::Sum), 125.5);
    }
}
