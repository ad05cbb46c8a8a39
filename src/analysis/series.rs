//! Chart-ready series.

use crate::models::{BucketSummary, ChartSeries};

pub const SERIES_TOTAL: &str = "total";
pub const SERIES_SUM: &str = "sum";
pub const SERIES_COMPLETED: &str = "completed";
pub const SERIES_PENDING: &str = "pending";
pub const SERIES_COMPLETION_RATE: &str = "completion_rate";

/// Labels plus one value per label for each series, oldest period first.
///
/// Completion series are only emitted when some bucket tracks completion.
pub fn chart_series(buckets: &[BucketSummary]) -> ChartSeries {
    let mut chart = ChartSeries {
        labels: buckets.iter().map(|b| b.period.label.clone()).collect(),
        ..Default::default()
    };

    chart.series.insert(
        SERIES_TOTAL.to_string(),
        buckets.iter().map(|b| b.metric.total as f64).collect(),
    );
    chart.series.insert(
        SERIES_SUM.to_string(),
        buckets.iter().map(|b| b.metric.sum).collect(),
    );

    if buckets.iter().any(|b| b.metric.tracks_completion()) {
        chart.series.insert(
            SERIES_COMPLETED.to_string(),
            buckets
                .iter()
                .map(|b| b.metric.completed.unwrap_or(0) as f64)
                .collect(),
        );
        chart.series.insert(
            SERIES_PENDING.to_string(),
            buckets
                .iter()
                .map(|b| b.metric.pending.unwrap_or(b.metric.total) as f64)
                .collect(),
        );
        chart.series.insert(
            SERIES_COMPLETION_RATE.to_string(),
            buckets.iter().map(|b| b.completion_rate).collect(),
        );
    }

    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateMetric, Period};
    use chrono::NaiveDate;

    fn summary(label: &str, metric: AggregateMetric) -> BucketSummary {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        BucketSummary {
            period: Period {
                start: day,
                end: day.succ_opt().unwrap(),
                offset: 0,
                label: label.to_string(),
            },
            completion_rate: metric.rate(),
            metric,
        }
    }

    #[test]
    fn test_series_align_with_labels() {
        let buckets = vec![
            summary(
                "Feb 2024",
                AggregateMetric {
                    total: 10,
                    completed: Some(5),
                    pending: Some(5),
                    sum: 0.0,
                },
            ),
            summary("Mar 2024", AggregateMetric::default()),
        ];

        let chart = chart_series(&buckets);

        assert_eq!(chart.labels, vec!["Feb 2024", "Mar 2024"]);
        for values in chart.series.values() {
            assert_eq!(values.len(), chart.labels.len());
        }
        assert_eq!(chart.series[SERIES_TOTAL], vec![10.0, 0.0]);
        assert_eq!(chart.series[SERIES_COMPLETION_RATE], vec![50.0, 0.0]);
        assert_eq!(chart.series[SERIES_PENDING], vec![5.0, 0.0]);
    }

    #[test]
    fn test_completion_series_omitted_when_untracked() {
        let buckets = vec![summary(
            "Mar 2024",
            AggregateMetric {
                total: 3,
                completed: None,
                pending: None,
                sum: 9.0,
            },
        )];

        let chart = chart_series(&buckets);

        assert!(chart.series.contains_key(SERIES_TOTAL));
        assert!(chart.series.contains_key(SERIES_SUM));
        assert!(!chart.series.contains_key(SERIES_COMPLETED));
        assert!(!chart.series.contains_key(SERIES_COMPLETION_RATE));
    }

    #[test]
    fn test_empty_buckets_yield_empty_series() {
        let chart = chart_series(&[]);
        assert!(chart.labels.is_empty());
        assert!(chart.series[SERIES_TOTAL].is_empty());
    }
}
