use super::RowFilterPass;
use super::error::ConfigurationError;
use crate::grammar::{self, MATCH_EXACT};
use crate::segment::ReportSource;
use crate::table::{DataTable, ReportRow, SEGMENT_FILTER, SEGMENT_VALUE};
use serde_json::Value;

/// Converts the `segmentValue` the query layer attached to each row into a
/// segment filter. The segment is the first one of the report's dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentValueFilter {
    segment: Option<String>,
}

impl SegmentValueFilter {
    /// Resolve the segment from the report's dimension.
    ///
    /// Dimensions without segments, or whose first segment needs a custom
    /// resolver, yield a pass that never writes anything.
    pub fn for_report(report: &dyn ReportSource) -> Self {
        let segment = report
            .first_segment()
            .filter(|descriptor| !descriptor.has_custom_resolver && !descriptor.key.is_empty())
            .map(|descriptor| descriptor.key.clone());
        Self { segment }
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    fn annotate(&self, table: &mut DataTable, segment: &str) -> usize {
        if table.rows_count() == 0 {
            return 0;
        }

        let mut annotated = 0;
        for row in table.rows.iter_mut() {
            let Some(value) = segment_value(row) else {
                continue;
            };
            let filter = grammar::build_escaped_clause(segment, MATCH_EXACT, &value);
            if row.set_metadata_if_absent(SEGMENT_FILTER, filter) {
                annotated += 1;
            }
        }
        annotated
    }
}

/// The raw segment value of a row as text. `null` and `false` mean absent.
fn segment_value(row: &ReportRow) -> Option<String> {
    match row.metadata(SEGMENT_VALUE)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        _ => None,
    }
}

impl RowFilterPass for SegmentValueFilter {
    fn name(&self) -> &'static str {
        "segment_value"
    }

    fn apply(&self, table: &mut DataTable) -> Result<usize, ConfigurationError> {
        let Some(segment) = self.segment.as_deref() else {
            return Ok(0);
        };
        let mut annotated = 0;
        table.walk_mut(&mut |t| annotated += self.annotate(t, segment));
        Ok(annotated)
    }
}
