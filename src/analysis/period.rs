//! Period bucketing.
//!
//! Splits records into contiguous calendar periods anchored on a reference
//! date. Periods are always returned oldest first; `Period::offset` counts
//! backwards from the reference period (offset 0).

use crate::error::AnalyticsError;
use crate::models::{Bucket, Period, Record, TimedRecord, WeekStart, WindowSpec, WindowUnit};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

/// Records split into periods, with counts of rows that did not land anywhere.
#[derive(Debug, Clone)]
pub struct Bucketing<'a> {
    /// Buckets, oldest first.
    pub buckets: Vec<Bucket<'a>>,
    /// Rows whose timestamp could not be parsed.
    pub skipped: usize,
    /// Ids of the skipped rows, in input order.
    pub skipped_ids: Vec<String>,
    /// Rows with a valid timestamp outside the overall span.
    pub out_of_span: usize,
}

impl<'a> Bucketing<'a> {
    /// First day of the oldest period.
    pub fn span_start(&self) -> Option<NaiveDate> {
        self.buckets.first().map(|b| b.period.start)
    }

    /// First day after the newest period.
    pub fn span_end(&self) -> Option<NaiveDate> {
        self.buckets.last().map(|b| b.period.end)
    }

    /// Records placed in a bucket.
    pub fn in_span(&self) -> usize {
        self.buckets.iter().map(Bucket::count).sum()
    }
}

/// Parse an exported timestamp.
///
/// Accepts RFC 3339, naive date-times (read as UTC, `T` or space separated,
/// optional fractional seconds) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // Postgres style offsets without minutes, e.g. "2024-03-15 10:00:00+00"
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// First day of the week containing `date`.
pub fn week_start_of(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let days_since = match week_start {
        WeekStart::Monday => date.weekday().num_days_from_monday(),
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
    };
    date - Duration::days(days_since as i64)
}

/// Bounds of the period `offset` steps before the one containing `reference`.
fn bounds_at(reference: NaiveDate, window: &WindowSpec, offset: u32) -> Option<(NaiveDate, NaiveDate)> {
    let bounds = match window.unit() {
        WindowUnit::Day => {
            let start = reference.checked_sub_signed(Duration::days(offset as i64))?;
            (start, start.succ_opt()?)
        }
        WindowUnit::Week => {
            let anchor = week_start_of(reference, window.week_start());
            let start = anchor.checked_sub_signed(Duration::weeks(offset as i64))?;
            (start, start.checked_add_signed(Duration::weeks(1))?)
        }
        WindowUnit::Month => {
            let first = reference.with_day(1)?;
            let start = first.checked_sub_months(Months::new(offset))?;
            (start, start.checked_add_months(Months::new(1))?)
        }
    };
    Some(bounds)
}

/// Day and week labels carry the year only when the window crosses one.
fn label_for(unit: WindowUnit, start: NaiveDate, with_year: bool) -> String {
    match (unit, with_year) {
        (WindowUnit::Day, false) => start.format("%b %d").to_string(),
        (WindowUnit::Day, true) => start.format("%b %d, %Y").to_string(),
        (WindowUnit::Week, false) => format!("Week of {}", start.format("%b %d")),
        (WindowUnit::Week, true) => format!("Week of {}", start.format("%b %d, %Y")),
        (WindowUnit::Month, _) => start.format("%b %Y").to_string(),
    }
}

/// Check that every period of the window exists in the supported calendar.
pub fn check_window(reference: NaiveDate, window: &WindowSpec) -> Result<(), AnalyticsError> {
    let newest = bounds_at(reference, window, 0);
    let oldest = bounds_at(reference, window, window.count() - 1);
    match (oldest, newest) {
        (Some(_), Some(_)) => Ok(()),
        _ => Err(AnalyticsError::WindowOutOfRange {
            count: window.count(),
            unit: window.unit(),
            reference,
        }),
    }
}

/// Periods for a window, oldest first, contiguous and non-overlapping.
///
/// A window that [`check_window`] rejects yields only the periods that exist.
pub fn periods(reference: NaiveDate, window: &WindowSpec) -> Vec<Period> {
    let bounds: Vec<(u32, NaiveDate, NaiveDate)> = (0..window.count())
        .rev()
        .filter_map(|offset| {
            bounds_at(reference, window, offset).map(|(start, end)| (offset, start, end))
        })
        .collect();

    let with_year = match (bounds.first(), bounds.last()) {
        (Some(oldest), Some(newest)) => oldest.1.year() != newest.1.year(),
        _ => false,
    };

    bounds
        .into_iter()
        .map(|(offset, start, end)| Period {
            start,
            end,
            offset,
            label: label_for(window.unit(), start, with_year),
        })
        .collect()
}

/// Split records into the window's periods.
///
/// Every record whose creation day falls inside the overall span lands in
/// exactly one bucket. Unparseable timestamps are logged and counted, never
/// fatal. An empty input yields empty buckets.
pub fn bucketize<'a>(
    records: &'a [Record],
    reference: NaiveDate,
    window: &WindowSpec,
) -> Bucketing<'a> {
    bucketize_refs(records.iter(), reference, window)
}

/// Same as [`bucketize`] over borrowed records, e.g. the output of a filter.
pub fn bucketize_refs<'a, I>(records: I, reference: NaiveDate, window: &WindowSpec) -> Bucketing<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut buckets: Vec<Bucket<'a>> = periods(reference, window)
        .into_iter()
        .map(Bucket::empty)
        .collect();

    let mut bucketing = Bucketing {
        buckets: Vec::new(),
        skipped: 0,
        skipped_ids: Vec::new(),
        out_of_span: 0,
    };

    let span = match (buckets.first(), buckets.last()) {
        (Some(first), Some(last)) => Some((first.period.start, last.period.end)),
        _ => None,
    };

    for record in records {
        let Some(created_at) = parse_timestamp(&record.created_at) else {
            warn!(
                "Skipping record {}: unparseable timestamp '{}'",
                record.id, record.created_at
            );
            bucketing.skipped += 1;
            bucketing.skipped_ids.push(record.id.clone());
            continue;
        };

        let day = created_at.date_naive();
        let in_span = matches!(span, Some((start, end)) if start <= day && day < end);
        if !in_span {
            bucketing.out_of_span += 1;
            continue;
        }

        // Last period starting on or before the day; in span so at least one exists.
        let index = buckets.partition_point(|b| b.period.start <= day) - 1;
        buckets[index].records.push(TimedRecord { record, created_at });
    }

    for bucket in &buckets {
        debug!("{}: {} records", bucket.period.label, bucket.count());
    }

    bucketing.buckets = buckets;
    bucketing
}
