//! Synthetic records for tests.
//!
//! Dashboards used to fill empty charts with generated demo rows. That data
//! lives here, compiled only for tests, and never reaches a report.

use crate::models::Record;
use chrono::{Duration, NaiveDate};

const MARKETS: [Option<&str>; 5] = [
    Some("Lagos"),
    Some("Nairobi"),
    None,
    Some("Accra"),
    Some("Lagos"),
];

const CATEGORIES: [&str; 3] = ["Electronics", "Fashion", "Groceries"];

const STATUSES: [&str; 3] = ["completed", "pending", "in_review"];

/// `count` records spaced `step_hours` apart starting at midnight on `start`.
///
/// Markets, categories, statuses and agents cycle deterministically; every
/// fifth market is missing.
pub fn synthetic_records(count: usize, start: NaiveDate, step_hours: i64) -> Vec<Record> {
    let origin = start.and_hms_opt(0, 0, 0).unwrap().and_utc();

    (0..count)
        .map(|i| {
            let created_at = origin + Duration::hours(step_hours * i as i64);
            Record {
                id: format!("rec-{i:04}"),
                created_at: created_at.to_rfc3339(),
                agent_id: Some(format!("agent-{}", i % 4)),
                market_name: MARKETS[i % MARKETS.len()].map(String::from),
                category_name: Some(CATEGORIES[i % CATEGORIES.len()].to_string()),
                status: Some(STATUSES[i % STATUSES.len()].to_string()),
                task_type: None,
                completed: None,
                amount: Some((i % 10) as f64 * 2.5),
            }
        })
        .collect()
}

/// A record with a market and completion flag, for compact test setup.
pub fn record(id: &str, created_at: &str, market: Option<&str>, completed: Option<bool>) -> Record {
    Record {
        market_name: market.map(String::from),
        completed,
        ..Record::new(id, created_at)
    }
}
