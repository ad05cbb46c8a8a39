//! Record aggregation and grouping.
//!
//! This module turns a set of records (usually one bucket) into counts,
//! completion splits, sums and per-group breakdowns.

use crate::models::{AggregateMetric, Bucket, GroupCount, GroupKey, Record};
use std::collections::HashMap;

/// Completion rate in percent. Zero when `total` is zero.
pub fn rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (completed as f64 / total as f64) * 100.0
    }
}

/// Aggregate a set of records.
///
/// Completion is tracked once any record carries a flag; records without
/// one then count as pending so that `completed + pending == total`.
pub fn aggregate<'a, I>(records: I) -> AggregateMetric
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut metric = AggregateMetric::default();
    let mut completed = 0;
    let mut tracked = false;

    for record in records {
        metric.total += 1;
        metric.sum += record.amount.unwrap_or(0.0);

        if let Some(flag) = record.is_completed() {
            tracked = true;
            if flag {
                completed += 1;
            }
        }
    }

    if tracked {
        metric.completed = Some(completed);
        metric.pending = Some(metric.total - completed);
    }

    metric
}

/// Aggregate the records of one bucket.
pub fn aggregate_bucket(bucket: &Bucket<'_>) -> AggregateMetric {
    aggregate(bucket.records.iter().map(|r| r.record))
}

/// Count records per value of `key`, largest group first.
///
/// Records with a missing or blank key are left out; they are not folded
/// into an "unknown" group. Keys match ignoring ASCII case, the same way
/// record filters do, and the first spelling seen names the group. Equal
/// counts keep first-appearance order.
pub fn group_counts<'a, I>(records: I, key: GroupKey) -> Vec<GroupCount>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts: Vec<GroupCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(value) = record.group_value(key) else {
            continue;
        };

        let folded = value.to_ascii_lowercase();
        match index.get(&folded) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(folded, counts.len());
                counts.push(GroupCount {
                    key: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-appearance order among ties
    counts.sort_by_key(|g| std::cmp::Reverse(g.count));
    counts
}

/// Full metrics per value of `key`, in first-appearance order.
///
/// Same exclusion and key matching as [`group_counts`].
pub fn group_metrics<'a, I>(records: I, key: GroupKey) -> Vec<(String, AggregateMetric)>
where
    I: IntoIterator<Item = &'a Record>,
{
    // (folded key, display name)
    let mut order: Vec<(String, String)> = Vec::new();
    let mut grouped: HashMap<String, Vec<&'a Record>> = HashMap::new();

    for record in records {
        let Some(value) = record.group_value(key) else {
            continue;
        };

        let folded = value.to_ascii_lowercase();
        grouped
            .entry(folded.clone())
            .or_insert_with(|| {
                order.push((folded, value.to_string()));
                Vec::new()
            })
            .push(record);
    }

    order
        .into_iter()
        .map(|(folded, name)| {
            let metric = grouped
                .remove(&folded)
                .map(|rows| aggregate(rows))
                .unwrap_or_default();
            (name, metric)
        })
        .collect()
}
