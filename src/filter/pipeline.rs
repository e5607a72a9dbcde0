use super::error::ConfigurationError;
use super::{
    LabelMappingFilter, PresentationValueFilter, RowFilterPass, SegmentFilter, SegmentValueFilter,
};
use crate::config::{EngineConfig, PassConfig};
use crate::segment::ReportSource;
use crate::table::DataTable;

/// Outcome of one pass of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub pass: &'static str,
    /// Rows that received a value from this pass
    pub annotated: usize,
    pub error: Option<ConfigurationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub passes: Vec<PassReport>,
}

impl PipelineReport {
    pub fn errors(&self) -> impl Iterator<Item = &ConfigurationError> {
        self.passes.iter().filter_map(|p| p.error.as_ref())
    }

    pub fn total_annotated(&self) -> usize {
        self.passes.iter().map(|p| p.annotated).sum()
    }
}

/// Ordered list of passes applied to a report table.
///
/// Each pass completes over the whole tree before the next one starts, so an
/// earlier pass always wins the `segmentFilter` of a row.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn RowFilterPass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pass(mut self, pass: impl RowFilterPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn push(&mut self, pass: Box<dyn RowFilterPass>) {
        self.passes.push(pass);
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Build the configured pipeline for one report
    pub fn from_config(config: &EngineConfig, report: &dyn ReportSource) -> Self {
        let escape = config.grammar.escape_labels;
        let mut pipeline = Self::new();

        for pass in &config.pipeline {
            match pass {
                PassConfig::Segment {
                    segments,
                    delimiter,
                } => {
                    let filter = if segments.len() == 1 {
                        SegmentFilter::single(segments[0].clone())
                    } else {
                        SegmentFilter::delimited(segments.iter().cloned(), delimiter.clone())
                    };
                    pipeline.push(Box::new(filter.escape_labels(escape)));
                }
                PassConfig::LabelMapping { segment, mapping } => {
                    match label_mapping(segment.as_deref(), mapping.as_ref(), report) {
                        Some(filter) => pipeline.push(Box::new(filter.escape_labels(escape))),
                        None => log::debug!("No label mapping available, pass skipped"),
                    }
                }
                PassConfig::SegmentValue => {
                    pipeline.push(Box::new(SegmentValueFilter::for_report(report)));
                }
                PassConfig::PresentationValue => {
                    pipeline.push(Box::new(PresentationValueFilter::for_report(report)));
                }
            }
        }

        pipeline
    }

    /// Run every pass in order. Configuration errors are logged and recorded,
    /// and never stop the remaining passes.
    pub fn run(&self, table: &mut DataTable) -> PipelineReport {
        let mut report = PipelineReport::default();

        for pass in &self.passes {
            let outcome = match pass.apply(table) {
                Ok(annotated) => PassReport {
                    pass: pass.name(),
                    annotated,
                    error: None,
                },
                Err(err) => {
                    log::warn!("{} pass not applied: {}", pass.name(), err);
                    PassReport {
                        pass: pass.name(),
                        annotated: 0,
                        error: Some(err),
                    }
                }
            };
            log::debug!("{} pass annotated {} rows", outcome.pass, outcome.annotated);
            report.passes.push(outcome);
        }

        report
    }
}

/// Explicit segment/mapping from the config, completed by the first segment
/// of the report's dimension.
fn label_mapping(
    segment: Option<&str>,
    mapping: Option<&std::collections::BTreeMap<String, String>>,
    report: &dyn ReportSource,
) -> Option<LabelMappingFilter> {
    let descriptor = report.first_segment();
    let segment = segment
        .map(str::to_string)
        .or_else(|| descriptor.map(|d| d.key.clone()))?;
    let mapping = mapping
        .cloned()
        .or_else(|| descriptor.and_then(|d| d.label_to_value.clone()))?;
    Some(LabelMappingFilter::new(segment, mapping))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{Dimension, SegmentDescriptor};
    use crate::table::{ReportRow, SEGMENT_VALUE};

    #[test]
    fn test_first_pass_wins() {
        let dimension = Dimension::new(vec![SegmentDescriptor::new("deviceType")]);
        let pipeline = Pipeline::new()
            .with_pass(SegmentFilter::single("deviceType"))
            .with_pass(SegmentValueFilter::for_report(&dimension));

        let mut table = DataTable::new(vec![
            ReportRow::new("Desktop").with_metadata(SEGMENT_VALUE, "desktop"),
        ]);
        let report = pipeline.run(&mut table);

        assert_eq!(table.rows[0].segment_filter(), Some("deviceType==Desktop"));
        assert_eq!(report.total_annotated(), 1);
        assert_eq!(report.passes[1].annotated, 0);
    }

    #[test]
    fn test_configuration_error_does_not_stop_pipeline() {
        let pipeline = Pipeline::new()
            .with_pass(SegmentFilter::delimited(["dim1", "dim2"], ""))
            .with_pass(SegmentFilter::single("label"));

        let mut table = DataTable::from_labels(&["A-B"]);
        let report = pipeline.run(&mut table);

        assert_eq!(report.errors().count(), 1);
        assert_eq!(table.rows[0].segment_filter(), Some("label==A-B"));
    }

    #[test]
    fn test_from_config_label_mapping_defaults_to_dimension() {
        let dimension = Dimension::new(vec![
            SegmentDescriptor::new("deviceType").with_label_to_value([("Tablet", "2")]),
        ]);
        let config = EngineConfig {
            pipeline: vec![PassConfig::LabelMapping {
                segment: None,
                mapping: None,
            }],
            ..EngineConfig::default()
        };

        let pipeline = Pipeline::from_config(&config, &dimension);
        assert_eq!(pipeline.pass_names(), vec!["label_mapping"]);

        let mut table = DataTable::from_labels(&["Tablet"]);
        pipeline.run(&mut table);
        assert_eq!(table.rows[0].segment_filter(), Some("deviceType==2"));
    }

    #[test]
    fn test_from_config_skips_unavailable_label_mapping() {
        let config = EngineConfig {
            pipeline: vec![
                PassConfig::LabelMapping {
                    segment: None,
                    mapping: None,
                },
                PassConfig::SegmentValue,
            ],
            ..EngineConfig::default()
        };
        let pipeline = Pipeline::from_config(&config, &Dimension::default());
        assert_eq!(pipeline.pass_names(), vec!["segment_value"]);
    }
}
