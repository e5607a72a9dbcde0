use crate::filter::PipelineReport;
use crate::presenter::{SegmentCondition, resolve_display_name};
use crate::segment::SegmentRegistry;
use crate::table::{DataTable, PRESENTATION_VALUE};
use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::json;
use std::fmt::Write as _;

fn create_styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h)).collect::<Vec<_>>());
    table
}

/// Annotated rows as a text table, followed by a pipeline summary
pub fn format_annotated_text(name: &str, table: &DataTable, report: &PipelineReport) -> String {
    let mut out = String::new();

    let title = if name.is_empty() { "Report" } else { name };
    let _ = writeln!(out, "{}", title.bold());

    let mut rows = create_styled_table(&["Row", "Label", "segmentFilter", "segment_value"]);
    for (path, row) in table.flatten() {
        rows.add_row(vec![
            Cell::new(path),
            Cell::new(&row.label),
            Cell::new(row.segment_filter().unwrap_or("-")),
            Cell::new(row.metadata_str(PRESENTATION_VALUE).unwrap_or("-")),
        ]);
    }
    let _ = writeln!(out, "{rows}");

    let _ = writeln!(out, "\n{}", "Passes".bold());
    for pass in &report.passes {
        match &pass.error {
            Some(err) => {
                let _ = writeln!(out, "  {:<20} {}", pass.pass, err.to_string().yellow());
            }
            None => {
                let _ = writeln!(out, "  {:<20} {} rows", pass.pass, pass.annotated);
            }
        }
    }

    out
}

/// Annotated table and pipeline summary as pretty JSON
pub fn format_annotated_json(name: &str, table: &DataTable, report: &PipelineReport) -> String {
    let passes: Vec<_> = report
        .passes
        .iter()
        .map(|p| {
            json!({
                "pass": p.pass,
                "annotated": p.annotated,
                "error": p.error.as_ref().map(|e| e.to_string()),
            })
        })
        .collect();

    let output = json!({
        "name": name,
        "table": table,
        "passes": passes,
    });
    serde_json::to_string_pretty(&output).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Parsed expression as a text table
pub fn format_conditions_text(
    groups: &[Vec<SegmentCondition>],
    registry: &SegmentRegistry,
) -> String {
    let mut table = create_styled_table(&["Group", "Segment", "Operator", "Value"]);
    for (idx, group) in groups.iter().enumerate() {
        for condition in group {
            table.add_row(vec![
                Cell::new(idx + 1),
                Cell::new(resolve_display_name(&condition.key, registry)),
                Cell::new(&condition.operator),
                Cell::new(&condition.value),
            ]);
        }
    }
    format!("{table}\n")
}

pub fn format_conditions_json(
    groups: &[Vec<SegmentCondition>],
    registry: &SegmentRegistry,
) -> String {
    let groups: Vec<Vec<_>> = groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|c| {
                    json!({
                        "segment": c.key,
                        "name": resolve_display_name(&c.key, registry),
                        "operator": c.operator,
                        "value": c.value,
                    })
                })
                .collect()
        })
        .collect();
    serde_json::to_string_pretty(&json!({ "and": groups }))
        .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}
