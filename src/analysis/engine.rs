//! End-to-end analytics run.
//!
//! Validates options, filters and buckets the records, then derives every
//! section of an [`AnalyticsReport`]. Configuration problems are returned
//! before any record is looked at; data-quality problems end up in
//! `warnings`.

use super::aggregator::{aggregate_bucket, group_counts};
use super::growth::growth;
use super::period::{bucketize_refs, check_window};
use super::ranking::{rank_groups, top_n};
use super::select::{filter_records, paginate, RecordFilter};
use super::series::chart_series;
use crate::error::{AnalyticsError, Result};
use crate::models::{
    AnalyticsReport, BucketSummary, GroupKey, GrowthSummary, Metric, Page, Record, ReportMetadata,
    WindowSpec,
};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

/// Skipped ids listed in a warning before it is cut short.
const MAX_LISTED_IDS: usize = 10;

/// A page of selected records to include in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
}

/// Everything that parameterizes a run.
#[derive(Debug, Clone)]
pub struct AnalyticsOptions {
    /// Where the records came from, for the report header.
    pub source: String,
    /// Date anchoring the newest period.
    pub reference_date: NaiveDate,
    pub window: WindowSpec,
    pub group_by: GroupKey,
    pub metric: Metric,
    /// Leaderboard size.
    pub top: usize,
    pub filter: RecordFilter,
    pub page: Option<PageRequest>,
    /// Stamped into the report metadata.
    pub generated_at: DateTime<Utc>,
}

impl AnalyticsOptions {
    /// Options with default grouping (market by count, top 5) and no filter.
    pub fn new(reference_date: NaiveDate, window: WindowSpec) -> Self {
        Self {
            source: String::new(),
            reference_date,
            window,
            group_by: GroupKey::default(),
            metric: Metric::default(),
            top: 5,
            filter: RecordFilter::default(),
            page: None,
            generated_at: Utc::now(),
        }
    }

    /// Fail fast on settings that cannot produce a report.
    pub fn validate(&self) -> Result<()> {
        check_window(self.reference_date, &self.window)?;
        if self.top == 0 {
            return Err(AnalyticsError::InvalidTopN);
        }
        if let Some(request) = self.page {
            if request.page == 0 {
                return Err(AnalyticsError::InvalidPage(request.page));
            }
            if request.page_size == 0 {
                return Err(AnalyticsError::InvalidPageSize);
            }
        }
        Ok(())
    }
}

/// Run the full aggregation over an in-memory record list.
pub fn run(records: &[Record], options: &AnalyticsOptions) -> Result<AnalyticsReport> {
    options.validate()?;

    let selected = filter_records(records, &options.filter);
    if !options.filter.is_empty() {
        info!(
            "Filter kept {} of {} records",
            selected.len(),
            records.len()
        );
    }

    let bucketing = bucketize_refs(
        selected.iter().copied(),
        options.reference_date,
        &options.window,
    );

    let buckets: Vec<BucketSummary> = bucketing
        .buckets
        .iter()
        .map(|bucket| {
            let metric = aggregate_bucket(bucket);
            BucketSummary {
                period: bucket.period.clone(),
                completion_rate: metric.rate(),
                metric,
            }
        })
        .collect();

    let chart = chart_series(&buckets);
    let growth = growth_summary(&buckets);

    let in_span: Vec<&Record> = bucketing
        .buckets
        .iter()
        .flat_map(|bucket| bucket.rows())
        .collect();
    let breakdown = group_counts(in_span.iter().copied(), options.group_by);
    let ranked_list = top_n(
        rank_groups(in_span.iter().copied(), options.group_by, options.metric),
        options.top,
    );
    debug!(
        "Ranked {} {} groups by {}",
        ranked_list.len(),
        options.group_by,
        options.metric
    );

    let mut warnings = Vec::new();
    if bucketing.skipped > 0 {
        warn!(
            "{} records skipped due to unparseable timestamps",
            bucketing.skipped
        );
        warnings.push(skipped_warning(&bucketing.skipped_ids));
    }

    let page = match options.page {
        Some(request) => {
            let page = paginate(&selected, request.page, request.page_size)?;
            Some(Page {
                items: page.items.into_iter().cloned().collect(),
                page: page.page,
                page_size: page.page_size,
                total_items: page.total_items,
                total_pages: page.total_pages,
            })
        }
        None => None,
    };

    // periods() is never empty for a validated window
    let (span_start, span_end) = match (bucketing.span_start(), bucketing.span_end()) {
        (Some(start), Some(end)) => (start, end),
        _ => (options.reference_date, options.reference_date),
    };

    let metadata = ReportMetadata {
        source: options.source.clone(),
        generated_at: options.generated_at,
        reference_date: options.reference_date,
        window_unit: options.window.unit(),
        window_count: options.window.count(),
        span_start,
        span_end,
        records_read: records.len(),
        records_selected: selected.len(),
        records_in_span: bucketing.in_span(),
        records_out_of_span: bucketing.out_of_span,
        records_skipped: bucketing.skipped,
    };

    Ok(AnalyticsReport {
        metadata,
        buckets,
        chart,
        growth,
        group_by: options.group_by,
        metric: options.metric,
        breakdown,
        ranked_list,
        warnings,
        page,
    })
}

/// Growth of the newest bucket against the one before it.
fn growth_summary(buckets: &[BucketSummary]) -> Option<GrowthSummary> {
    let [.., previous, current] = buckets else {
        return None;
    };

    let completed = if current.metric.tracks_completion() || previous.metric.tracks_completion() {
        Some(growth(
            current.metric.completed.unwrap_or(0) as f64,
            previous.metric.completed.unwrap_or(0) as f64,
        ))
    } else {
        None
    };

    Some(GrowthSummary {
        current_label: current.period.label.clone(),
        previous_label: previous.period.label.clone(),
        total: growth(current.metric.total as f64, previous.metric.total as f64),
        completed,
    })
}

fn skipped_warning(ids: &[String]) -> String {
    let mut listed = ids
        .iter()
        .take(MAX_LISTED_IDS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if ids.len() > MAX_LISTED_IDS {
        listed.push_str(&format!(", … ({} more)", ids.len() - MAX_LISTED_IDS));
    }

    format!(
        "{} record(s) skipped: unparseable created_at ({})",
        ids.len(),
        listed
    )
}
