//! Error types for the analytics engine.
//!
//! Only configuration problems are errors. Bad rows are skipped and
//! reported as warnings on the result instead.

use crate::models::WindowUnit;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while validating analytics options.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Window count must be at least 1 (got {0})")]
    InvalidWindowCount(u32),

    #[error("Window of {count} {unit} periods is too long (at most {max})")]
    WindowTooLong { count: u32, unit: WindowUnit, max: u32 },

    #[error("Window of {count} {unit} periods ending {reference} falls outside the supported calendar")]
    WindowOutOfRange {
        count: u32,
        unit: WindowUnit,
        reference: NaiveDate,
    },

    #[error("Unknown window unit '{0}' (expected day, week or month)")]
    UnknownWindowUnit(String),

    #[error("Unknown week start '{0}' (expected monday or sunday)")]
    UnknownWeekStart(String),

    #[error("Unknown group key '{0}' (expected market, category, status, task_type or agent)")]
    UnknownGroupKey(String),

    #[error("Unknown metric '{0}' (expected count, completed, completion_rate or sum)")]
    UnknownMetric(String),

    #[error("Top-N size must be at least 1")]
    InvalidTopN,

    #[error("Page numbers start at 1 (got {0})")]
    InvalidPage(usize),

    #[error("Page size must be at least 1")]
    InvalidPageSize,
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
