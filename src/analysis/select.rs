//! Record selection and pagination.
//!
//! Replaces the filter and page state that dashboard pages kept in
//! component-local variables with explicit parameters.

use crate::error::{AnalyticsError, Result};
use crate::models::{Page, Record};
use serde::{Deserialize, Serialize};

/// Optional exact-match filters. Matching ignores case and surrounding space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub market: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub agent: Option<String>,
}

impl RecordFilter {
    /// Whether no filter is set.
    pub fn is_empty(&self) -> bool {
        self.market.is_none()
            && self.category.is_none()
            && self.status.is_none()
            && self.agent.is_none()
    }

    /// Whether a record passes every filter that is set.
    pub fn matches(&self, record: &Record) -> bool {
        field_matches(&self.market, &record.market_name)
            && field_matches(&self.category, &record.category_name)
            && field_matches(&self.status, &record.status)
            && field_matches(&self.agent, &record.agent_id)
    }
}

fn field_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(wanted), Some(actual)) => wanted.trim().eq_ignore_ascii_case(actual.trim()),
    }
}

/// Records passing `filter`, in input order.
pub fn filter_records<'a>(records: &'a [Record], filter: &RecordFilter) -> Vec<&'a Record> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

/// One 1-based page of `items`. Pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Result<Page<T>> {
    if page == 0 {
        return Err(AnalyticsError::InvalidPage(page));
    }
    if page_size == 0 {
        return Err(AnalyticsError::InvalidPageSize);
    }

    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size).min(total_items);
    let end = start.saturating_add(page_size).min(total_items);

    Ok(Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_items,
        total_pages,
    })
}
