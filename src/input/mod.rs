//! Record loading from data-store exports.
//!
//! Accepts either a bare JSON array of rows or the store's response envelope
//! (`{"data": [...]}`). Rows that do not match the record shape are dropped
//! and reported, the rest are kept.

use crate::models::Record;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Path meaning "read standard input".
pub const STDIN_PATH: &str = "-";

/// Records read from an export.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    /// Rows that deserialized into records.
    pub records: Vec<Record>,
    /// One message per rejected row.
    pub rejected: Vec<String>,
}

impl LoadedRecords {
    /// Total rows seen in the export.
    pub fn rows_seen(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Export {
    Rows(Vec<Value>),
    Envelope { data: Vec<Value> },
}

/// Parse export text into records.
pub fn parse_records(content: &str) -> Result<LoadedRecords> {
    if content.trim().is_empty() {
        return Ok(LoadedRecords::default());
    }

    let export: Export = serde_json::from_str(content)
        .context("Expected a JSON array of rows or an object with a \"data\" array")?;
    let rows = match export {
        Export::Rows(rows) | Export::Envelope { data: rows } => rows,
    };

    let mut loaded = LoadedRecords::default();
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<Record>(row) {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                warn!("Skipping row {}: {}", index, e);
                loaded.rejected.push(format!("row {}: {}", index, e));
            }
        }
    }

    debug!(
        "Parsed {} records ({} rejected)",
        loaded.records.len(),
        loaded.rejected.len()
    );

    Ok(loaded)
}

/// Load records from a file, or from standard input when `path` is `-`.
pub fn load_records(path: &Path) -> Result<LoadedRecords> {
    let content = if path.as_os_str() == STDIN_PATH {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read records from stdin")?;
        buffer
    } else {
        if !path.exists() {
            bail!("Input file does not exist: {}", path.display());
        }
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    };

    parse_records(&content).with_context(|| format!("Failed to parse records from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_bare_array() {
        let loaded = parse_records(
            r#"[
                {"id": "a", "created_at": "2024-03-01T00:00:00Z", "market_name": "Lagos"},
                {"id": 7, "createdAt": "2024-03-02", "status": "completed"}
            ]"#,
        )
        .unwrap();

        assert_eq!(loaded.records.len(), 2);
        assert!(loaded.rejected.is_empty());
        assert_eq!(loaded.records[1].id, "7");
        assert_eq!(loaded.records[1].is_completed(), Some(true));
    }

    #[test]
    fn test_parse_envelope() {
        let loaded =
            parse_records(r#"{"data": [{"id": "a", "created_at": "2024-03-01"}], "count": 1}"#)
                .unwrap();
        assert_eq!(loaded.records.len(), 1);
    }

    #[test]
    fn test_rejects_rows_without_required_fields() {
        let loaded = parse_records(
            r#"[
                {"id": "a", "created_at": "2024-03-01"},
                {"id": "b"},
                "not an object"
            ]"#,
        )
        .unwrap();

        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.rejected.len(), 2);
        assert!(loaded.rejected[0].starts_with("row 1"));
        assert_eq!(loaded.rows_seen(), 3);
    }

    #[test]
    fn test_wrongly_typed_optional_fields_keep_the_row() {
        let loaded = parse_records(
            r#"[
                {"id": 1, "createdAt": "2024-03-01", "agentId": 7, "marketName": "Lagos"},
                {"id": 2, "createdAt": "2024-03-02", "marketName": {"id": 3}, "status": 4,
                 "completed": "yes", "amount": "12.5"},
                {"id": 3, "createdAt": "2024-03-03", "completed": [true], "amount": true}
            ]"#,
        )
        .unwrap();

        assert!(loaded.rejected.is_empty());
        assert_eq!(loaded.records.len(), 3);

        let first = &loaded.records[0];
        assert_eq!(first.agent_id.as_deref(), Some("7"));
        assert_eq!(first.market_name.as_deref(), Some("Lagos"));

        let second = &loaded.records[1];
        assert_eq!(second.market_name, None);
        assert_eq!(second.status.as_deref(), Some("4"));
        assert_eq!(second.completed, Some(true));
        assert_eq!(second.amount, Some(12.5));

        let third = &loaded.records[2];
        assert_eq!(third.completed, None);
        assert_eq!(third.amount, None);
    }

    #[test]
    fn test_empty_content_is_empty_export() {
        let loaded = parse_records("  \n").unwrap();
        assert_eq!(loaded.rows_seen(), 0);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(parse_records("{not json").is_err());
        assert!(parse_records(r#"{"rows": []}"#).is_err());
    }

    #[test]
    fn test_load_records_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "a", "created_at": "2024-03-01"}}]"#).unwrap();

        let loaded = load_records(file.path()).unwrap();
        assert_eq!(loaded.records.len(), 1);
    }

    #[test]
    fn test_load_sample_export() {
        use crate::analysis::{run, AnalyticsOptions};
        use crate::models::{WindowSpec, WindowUnit};
        use chrono::NaiveDate;

        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/sample_records.json");
        let loaded = load_records(&path).unwrap();

        assert_eq!(loaded.rows_seen(), 12);
        assert_eq!(loaded.records.len(), 11);
        assert_eq!(loaded.rejected.len(), 1);

        let options = AnalyticsOptions::new(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            WindowSpec::new(4, WindowUnit::Month).unwrap(),
        );
        let report = run(&loaded.records, &options).unwrap();

        assert_eq!(report.metadata.records_skipped, 1);
        assert_eq!(report.metadata.records_in_span, 10);
        let counts: Vec<_> = report.buckets.iter().map(|b| b.metric.total).collect();
        assert_eq!(counts, vec![2, 2, 3, 3]);

        let markets: Vec<_> = report
            .breakdown
            .iter()
            .map(|g| (g.key.as_str(), g.count))
            .collect();
        assert_eq!(markets, vec![("Lagos", 4), ("Accra", 2), ("Nairobi", 2)]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_records(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
