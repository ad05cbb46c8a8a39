//! Top-N ranking.

use super::aggregator::group_metrics;
use crate::models::{GroupKey, Metric, RankedEntity, Record};

/// Sort entities by value (highest first) and keep the first `n`.
///
/// Ties keep their input order. Shorter input is returned as is, never padded.
pub fn top_n(mut entities: Vec<RankedEntity>, n: usize) -> Vec<RankedEntity> {
    entities.sort_by(|a, b| b.value.total_cmp(&a.value));
    entities.truncate(n);
    entities
}

/// Rank every value of `key` by `metric`, highest first.
pub fn rank_groups<'a, I>(records: I, key: GroupKey, metric: Metric) -> Vec<RankedEntity>
where
    I: IntoIterator<Item = &'a Record>,
{
    let entities: Vec<RankedEntity> = group_metrics(records, key)
        .into_iter()
        .map(|(name, aggregate)| RankedEntity::new(name, aggregate.value_of(metric)))
        .collect();

    let len = entities.len();
    top_n(entities, len)
}
