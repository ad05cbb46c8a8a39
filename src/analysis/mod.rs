//! Analytics core.
//!
//! Pure functions over in-memory records: bucketing, aggregation, growth,
//! ranking, selection and chart series, tied together by [`engine::run`].

pub mod aggregator;
pub mod engine;
pub mod growth;
pub mod period;
pub mod ranking;
pub mod select;
pub mod series;

pub use aggregator::{aggregate, aggregate_bucket, group_counts, group_metrics, rate};
pub use engine::{run, AnalyticsOptions, PageRequest};
pub use growth::{direction, growth, growth_series};
pub use period::{bucketize, bucketize_refs, check_window, parse_timestamp, periods, Bucketing};
pub use ranking::{rank_groups, top_n};
pub use select::{filter_records, paginate, RecordFilter};
pub use series::chart_series;
