use super::RowFilterPass;
use super::error::ConfigurationError;
use crate::segment::{ReportSource, SegmentDescriptor};
use crate::table::{DataTable, ORIGINAL_LABEL, PRESENTATION_VALUE, ReportRow};

/// Attaches the raw value a client side table uses to build segments
/// (`segment_value` metadata). Nothing is escaped and existing values are
/// replaced: this is display data, not a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationValueFilter {
    source: Option<ValueSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueSource {
    /// The segment filters on the label itself
    Label,
    /// Prefer the label before formatting
    OriginalLabel,
}

impl PresentationValueFilter {
    pub fn for_report(report: &dyn ReportSource) -> Self {
        Self {
            source: report.first_segment().and_then(value_source),
        }
    }

    /// Whether this pass will write anything at all
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    fn annotate(&self, table: &mut DataTable, source: ValueSource) -> usize {
        let mut annotated = 0;
        for (_, row) in table.rows_with_summary_mut() {
            let value = match source {
                ValueSource::Label => row.label.clone(),
                ValueSource::OriginalLabel => original_label(row),
            };
            row.set_metadata(PRESENTATION_VALUE, value);
            annotated += 1;
        }
        annotated
    }
}

fn value_source(descriptor: &SegmentDescriptor) -> Option<ValueSource> {
    if descriptor.suggested_values_hook || descriptor.has_custom_resolver {
        return None;
    }
    if descriptor.custom_value_filter {
        Some(ValueSource::Label)
    } else {
        Some(ValueSource::OriginalLabel)
    }
}

fn original_label(row: &ReportRow) -> String {
    row.metadata_str(ORIGINAL_LABEL)
        .unwrap_or(&row.label)
        .to_string()
}

impl RowFilterPass for PresentationValueFilter {
    fn name(&self) -> &'static str {
        "presentation_value"
    }

    fn apply(&self, table: &mut DataTable) -> Result<usize, ConfigurationError> {
        let Some(source) = self.source else {
            return Ok(0);
        };
        let mut annotated = 0;
        table.walk_mut(&mut |t| annotated += self.annotate(t, source));
        Ok(annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Dimension;

    fn presentation_value(row: &ReportRow) -> Option<&str> {
        row.metadata_str(PRESENTATION_VALUE)
    }

    #[test]
    fn test_prefers_original_label() {
        let dimension = Dimension::new(vec![SegmentDescriptor::new("pageUrl")]);
        let mut table = DataTable::new(vec![
            ReportRow::new("/index").with_metadata(ORIGINAL_LABEL, "index.html"),
            ReportRow::new("/about"),
        ])
        .with_summary_row(ReportRow::new("Others"));

        PresentationValueFilter::for_report(&dimension)
            .apply(&mut table)
            .unwrap();

        assert_eq!(presentation_value(&table.rows[0]), Some("index.html"));
        assert_eq!(presentation_value(&table.rows[1]), Some("/about"));
        assert_eq!(
            presentation_value(table.summary_row.as_ref().unwrap()),
            Some("Others")
        );
    }

    #[test]
    fn test_custom_value_filter_uses_label() {
        let dimension = Dimension::new(vec![
            SegmentDescriptor::new("deviceType").with_custom_value_filter(true),
        ]);
        let mut table = DataTable::new(vec![
            ReportRow::new("Smartphone").with_metadata(ORIGINAL_LABEL, "smartphone"),
        ]);

        PresentationValueFilter::for_report(&dimension)
            .apply(&mut table)
            .unwrap();
        assert_eq!(presentation_value(&table.rows[0]), Some("Smartphone"));
    }

    #[test]
    fn test_skips_segments_with_resolvers() {
        for descriptor in [
            SegmentDescriptor::new("city").with_suggested_values_hook(true),
            SegmentDescriptor::new("visitId").with_custom_resolver(true),
        ] {
            let pass = PresentationValueFilter::for_report(&Dimension::new(vec![descriptor]));
            assert!(!pass.is_active());

            let mut table = DataTable::from_labels(&["a"]);
            assert_eq!(pass.apply(&mut table), Ok(0));
            assert_eq!(presentation_value(&table.rows[0]), None);
        }
    }

    #[test]
    fn test_does_not_touch_segment_filter() {
        let dimension = Dimension::new(vec![SegmentDescriptor::new("pageUrl")]);
        let mut table = DataTable::from_labels(&["a,b"]);
        PresentationValueFilter::for_report(&dimension)
            .apply(&mut table)
            .unwrap();

        assert_eq!(presentation_value(&table.rows[0]), Some("a,b"));
        assert_eq!(table.rows[0].segment_filter(), None);
    }
}
