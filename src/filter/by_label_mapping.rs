use super::RowFilterPass;
use super::error::ConfigurationError;
use crate::grammar::{self, MATCH_EXACT};
use crate::segment::SegmentDescriptor;
use crate::table::{DataTable, SEGMENT_FILTER};
use std::collections::BTreeMap;

/// Derives a segment filter by looking the label up in a label -> value table.
///
/// Used when the displayed label is not the stored value, e.g. device type
/// `1` is stored as `smartphone`. The row keeps its label; only the filter
/// carries the mapped value. Unlike [`super::SegmentFilter`] the summary row
/// is mapped too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMappingFilter {
    segment: String,
    mapping: BTreeMap<String, String>,
    escape_labels: bool,
}

impl LabelMappingFilter {
    pub fn new<I, K, V>(segment: impl Into<String>, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            segment: segment.into(),
            mapping: mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            escape_labels: false,
        }
    }

    /// Use the segment's own label -> value table, if it has one
    pub fn from_descriptor(descriptor: &SegmentDescriptor) -> Option<Self> {
        let mapping = descriptor.label_to_value.as_ref()?;
        Some(Self::new(descriptor.key.clone(), mapping.clone()))
    }

    pub fn escape_labels(mut self, escape: bool) -> Self {
        self.escape_labels = escape;
        self
    }

    fn annotate(&self, table: &mut DataTable) -> usize {
        let mut annotated = 0;
        for (_, row) in table.rows_with_summary_mut() {
            let Some(value) = self.mapping.get(&row.label).filter(|v| !v.is_empty()) else {
                continue;
            };
            let filter = if self.escape_labels {
                grammar::build_escaped_clause(&self.segment, MATCH_EXACT, value)
            } else {
                grammar::build_clause(&self.segment, MATCH_EXACT, value)
            };
            if row.set_metadata_if_absent(SEGMENT_FILTER, filter) {
                annotated += 1;
            }
        }
        annotated
    }
}

impl RowFilterPass for LabelMappingFilter {
    fn name(&self) -> &'static str {
        "label_mapping"
    }

    fn apply(&self, table: &mut DataTable) -> Result<usize, ConfigurationError> {
        if self.segment.is_empty() || self.mapping.is_empty() {
            return Ok(0);
        }
        let mut annotated = 0;
        table.walk_mut(&mut |t| annotated += self.annotate(t));
        Ok(annotated)
    }
}
