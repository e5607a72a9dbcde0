//! segment-filter - derive segment expressions from rendered report rows
//!
//! Given a report table and the segments of its dimension, the passes in
//! [`filter`] annotate every row with the expression that selects the raw
//! records behind it. [`recompose`] rebuilds the full label of a nested row
//! and [`presenter`] turns a stored expression back into readable text.

pub mod cli;
pub mod config;
pub mod display;
pub mod filter;
pub mod grammar;
pub mod presenter;
pub mod recompose;
pub mod row_action;
pub mod segment;
pub mod table;

use anyhow::Context;
use std::path::Path;

pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use config::{EngineConfig, PassConfig, load_config};
pub use filter::{
    ConfigurationError, LabelMappingFilter, Pipeline, PipelineReport, PresentationValueFilter,
    RowFilterPass, SegmentFilter, SegmentValueFilter,
};
pub use recompose::{DisplayTree, LabelRecomposer, RowRef};
pub use segment::{Dimension, ReportSource, SegmentDescriptor, SegmentRegistry};
pub use table::{DataTable, ReportDocument, ReportRow, load_report_document};

fn write_output_file(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file '{}'", path.display()))
}

fn load_document(path: &Path) -> anyhow::Result<ReportDocument> {
    load_report_document(path)
        .with_context(|| format!("Failed to load report '{}'", path.display()))
}

fn init_logging(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_logging(cli.log_level());

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let engine_config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    log::info!("Config profile: {}", engine_config.profile_name);

    let text = match &cli.command {
        Commands::Annotate { report } => {
            let mut document = load_document(report)?;
            let pipeline = Pipeline::from_config(&engine_config, &document);
            log::info!("Running passes: {}", pipeline.pass_names().join(", "));

            let outcome = pipeline.run(&mut document.table);
            match cli.format {
                OutputFormat::Text => {
                    display::format_annotated_text(&document.name, &document.table, &outcome)
                }
                OutputFormat::Json => {
                    display::format_annotated_json(&document.name, &document.table, &outcome)
                }
            }
        }
        Commands::Recompose { report, row } => {
            let document = load_document(report)?;
            let path = table::parse_row_path(row)
                .with_context(|| format!("Invalid row path '{row}', expected e.g. 0/2/1"))?;

            let tree = DisplayTree::from_data_table(&document.table, &engine_config.recompose);
            let at = tree
                .resolve_path(&path)
                .with_context(|| format!("No row at path '{row}'"))?;

            let recomposer = LabelRecomposer::with_rules(&tree, &engine_config.recompose);
            let label = recomposer.recompose(at)?;
            let segment = match document.first_segment() {
                Some(descriptor) => Some(recomposer.segment_for(
                    at,
                    &descriptor.key,
                    grammar::MATCH_EXACT,
                )?),
                None => None,
            };

            match cli.format {
                OutputFormat::Text => {
                    let mut text = format!("{label}\n");
                    if let Some(segment) = &segment {
                        text.push_str(&format!("{segment}\n"));
                    }
                    text
                }
                OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                    "row": row,
                    "label": label,
                    "segment": segment,
                }))?,
            }
        }
        Commands::Describe { expression, report } => {
            let registry = match report {
                Some(path) => engine_config.registry_for(&load_document(path)?),
                None => engine_config.segments.clone(),
            };
            let groups = presenter::parse_expression(expression)
                .with_context(|| format!("Cannot describe '{expression}'"))?;

            match cli.format {
                OutputFormat::Text => display::format_conditions_text(&groups, &registry),
                OutputFormat::Json => display::format_conditions_json(&groups, &registry),
            }
        }
        Commands::RowAction {
            report,
            label,
            api_method,
        } => {
            let document = load_document(report)?;
            let registry = engine_config.registry_for(&document);
            let action = row_action::SegmentRowAction::for_report(&document);
            let segment = action
                .segment_for_label(label)
                .context("Row action is not available: the report has no segment")?;

            let api_method = api_method.clone().unwrap_or_else(|| document.name.clone());
            let param =
                row_action::popover_param(&api_method, &segment, &serde_json::json!({}));
            let title = action.popover_title("Visits log", &segment, &registry);

            match cli.format {
                OutputFormat::Text => {
                    let mut text = format!("segment: {segment}\npopover: {param}\n");
                    if let Some(title) = &title {
                        text.push_str(&format!("title:   {title}\n"));
                    }
                    text
                }
                OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                    "segment": segment,
                    "popover": param,
                    "title": title,
                }))?,
            }
        }
    };

    print!("{text}");
    if let Some(path) = &cli.output {
        write_output_file(path, &text)?;
    }

    Ok(())
}
