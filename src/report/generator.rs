//! Markdown and JSON report generation.
//!
//! This module renders an [`AnalyticsReport`] for people (Markdown tables)
//! or for chart front-ends (JSON with `labels`, `series` and `ranked_list`).

use crate::config::ReportConfig;
use crate::models::{
    AnalyticsReport, BucketSummary, ChartSeries, GroupCount, Growth, GrowthSummary, Page,
    RankedEntity, Record, ReportMetadata,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalyticsReport, config: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# Tallyboard Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_periods_section(&report.buckets));

    if let Some(ref growth) = report.growth {
        output.push_str(&generate_growth_section(growth));
    }

    if config.include_series {
        output.push_str(&generate_series_section(&report.chart));
    }

    output.push_str(&generate_breakdown_section(
        &report.group_by.to_string(),
        &report.breakdown,
    ));
    output.push_str(&generate_leaderboard_section(
        &report.group_by.to_string(),
        &report.metric.to_string(),
        &report.ranked_list,
    ));

    if config.include_warnings {
        output.push_str(&generate_warnings_section(&report.warnings));
    }

    if let Some(ref page) = report.page {
        output.push_str(&generate_page_section(page));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if !metadata.source.is_empty() {
        section.push_str(&format!("- **Source:** {}\n", metadata.source));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Window:** {} × {} ending {}\n",
        metadata.window_count, metadata.window_unit, metadata.reference_date
    ));
    section.push_str(&format!(
        "- **Span:** {} to {} (exclusive)\n",
        metadata.span_start, metadata.span_end
    ));
    section.push_str(&format!("- **Records Read:** {}\n", metadata.records_read));
    if metadata.records_selected != metadata.records_read {
        section.push_str(&format!(
            "- **Records Selected:** {}\n",
            metadata.records_selected
        ));
    }
    section.push_str(&format!(
        "- **Records In Span:** {}\n",
        metadata.records_in_span
    ));
    if metadata.records_out_of_span > 0 {
        section.push_str(&format!(
            "- **Records Outside Span:** {}\n",
            metadata.records_out_of_span
        ));
    }
    if metadata.records_skipped > 0 {
        section.push_str(&format!(
            "- **Records Skipped:** {}\n",
            metadata.records_skipped
        ));
    }
    section.push('\n');

    section
}

/// Generate the per-period table.
fn generate_periods_section(buckets: &[BucketSummary]) -> String {
    let mut section = String::new();

    section.push_str("## Periods\n\n");

    if buckets.is_empty() {
        section.push_str("No periods in the window.\n\n");
        return section;
    }

    let tracked = buckets.iter().any(|b| b.metric.tracks_completion());

    if tracked {
        section.push_str("| Period | From | To | Total | Completed | Pending | Rate | Sum |\n");
        section.push_str("|:---|:---|:---|:---:|:---:|:---:|:---:|---:|\n");
    } else {
        section.push_str("| Period | From | To | Total | Sum |\n");
        section.push_str("|:---|:---|:---|:---:|---:|\n");
    }

    for bucket in buckets {
        let period = &bucket.period;
        let metric = &bucket.metric;
        if tracked {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {:.1}% | {:.2} |\n",
                period.label,
                period.start,
                period.last_day(),
                metric.total,
                metric.completed.unwrap_or(0),
                metric.pending.unwrap_or(metric.total),
                bucket.completion_rate,
                metric.sum
            ));
        } else {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {:.2} |\n",
                period.label,
                period.start,
                period.last_day(),
                metric.total,
                metric.sum
            ));
        }
    }
    section.push('\n');

    section
}

fn format_growth(growth: &Growth) -> String {
    format!(
        "{} {:+.1}% ({})",
        growth.direction.arrow(),
        growth.value,
        growth.direction
    )
}

/// Generate the growth section.
fn generate_growth_section(growth: &GrowthSummary) -> String {
    let mut section = String::new();

    section.push_str("## Growth\n\n");
    section.push_str(&format!(
        "*{} compared with {}*\n\n",
        growth.current_label, growth.previous_label
    ));
    section.push_str(&format!("- **Records:** {}\n", format_growth(&growth.total)));
    if let Some(ref completed) = growth.completed {
        section.push_str(&format!("- **Completed:** {}\n", format_growth(completed)));
    }
    section.push('\n');

    section
}

/// Generate the chart series table (one row per series).
fn generate_series_section(chart: &ChartSeries) -> String {
    if chart.labels.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Series\n\n");
    section.push_str(&format!("| Series | {} |\n", chart.labels.join(" | ")));
    section.push_str(&format!(
        "|:---|{}\n",
        ":---:|".repeat(chart.labels.len())
    ));

    for (name, values) in &chart.series {
        let cells: Vec<String> = values.iter().map(|v| format_number(*v)).collect();
        section.push_str(&format!("| {} | {} |\n", name, cells.join(" | ")));
    }
    section.push('\n');

    section
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Generate the span-wide breakdown.
fn generate_breakdown_section(group_by: &str, breakdown: &[GroupCount]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Breakdown by {}\n\n", group_by));

    if breakdown.is_empty() {
        section.push_str(&format!("No records carry a {} value.\n\n", group_by));
        return section;
    }

    let total: usize = breakdown.iter().map(|g| g.count).sum();

    section.push_str(&format!("| {} | Records | Share |\n", capitalize(group_by)));
    section.push_str("|:---|:---:|:---:|\n");
    for group in breakdown {
        let share = crate::analysis::rate(group.count, total);
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            group.key, group.count, share
        ));
    }
    section.push('\n');

    section
}

/// Generate the leaderboard.
fn generate_leaderboard_section(group_by: &str, metric: &str, ranked: &[RankedEntity]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Top {} by {}\n\n", group_by, metric));

    if ranked.is_empty() {
        section.push_str("Nothing to rank.\n\n");
        return section;
    }

    section.push_str(&format!("| # | {} | {} |\n", capitalize(group_by), metric));
    section.push_str("|:---:|:---|---:|\n");
    for (i, entity) in ranked.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            i + 1,
            entity.name,
            format_number(entity.value)
        ));
    }
    section.push('\n');

    section
}

/// Generate the warnings section.
fn generate_warnings_section(warnings: &[String]) -> String {
    if warnings.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Warnings\n\n");
    for warning in warnings {
        section.push_str(&format!("- ⚠️ {}\n", warning));
    }
    section.push('\n');

    section
}

/// Generate the records page.
fn generate_page_section(page: &Page<Record>) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Records (page {} of {}, {} total)\n\n",
        page.page,
        page.total_pages.max(1),
        page.total_items
    ));

    if page.items.is_empty() {
        section.push_str("No records on this page.\n\n");
        return section;
    }

    section.push_str("| ID | Created | Market | Category | Status | Agent |\n");
    section.push_str("|:---|:---|:---|:---|:---|:---|\n");
    for record in &page.items {
        section.push_str(&format!(
            "| `{}` | {} | {} | {} | {} | {} |\n",
            record.id,
            record.created_at,
            record.market_name.as_deref().unwrap_or("-"),
            record.category_name.as_deref().unwrap_or("-"),
            record.status.as_deref().unwrap_or("-"),
            record.agent_id.as_deref().unwrap_or("-"),
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by Tallyboard*\n".to_string()
}

fn capitalize(text: &str) -> String {
    let spaced = text.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalyticsReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
