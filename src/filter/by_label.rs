use super::RowFilterPass;
use super::error::ConfigurationError;
use crate::grammar::{self, MATCH_EXACT};
use crate::table::{DataTable, SEGMENT_FILTER};
use std::borrow::Cow;

/// Derives a segment filter from each row's label.
///
/// With one segment the whole label is the value (`deviceType==Desktop`).
/// With several segments the label is split by a delimiter and each part is
/// matched against the segment at the same position
/// (`dim1==A;dim2==B` for label `A-B`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFilter {
    segments: Vec<String>,
    delimiter: String,
    escape_labels: bool,
}

#[derive(Clone, Copy)]
enum Mode<'a> {
    Single(&'a str),
    Delimited(&'a str),
}

impl SegmentFilter {
    pub fn single(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
            delimiter: String::new(),
            escape_labels: false,
        }
    }

    pub fn delimited<S: Into<String>>(
        segments: impl IntoIterator<Item = S>,
        delimiter: impl Into<String>,
    ) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            delimiter: delimiter.into(),
            escape_labels: false,
        }
    }

    /// Escape reserved grammar characters in label values.
    ///
    /// Off by default so filters stay identical to links shared before.
    pub fn escape_labels(mut self, escape: bool) -> Self {
        self.escape_labels = escape;
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn mode(&self) -> Result<Mode<'_>, ConfigurationError> {
        match self.segments.as_slice() {
            [] => Err(ConfigurationError::MissingSegments),
            [only] if only.is_empty() => Err(ConfigurationError::MissingSegments),
            [only] => Ok(Mode::Single(only)),
            _ if self.delimiter.is_empty() => Err(ConfigurationError::MissingDelimiter {
                segments: self.segments.clone(),
            }),
            _ => Ok(Mode::Delimited(&self.delimiter)),
        }
    }

    fn value<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        if self.escape_labels {
            Cow::Owned(grammar::escape(raw))
        } else {
            Cow::Borrowed(raw)
        }
    }

    fn annotate_single(&self, table: &mut DataTable, segment: &str) -> usize {
        let mut annotated = 0;
        for row in table.rows.iter_mut() {
            if row.label.is_empty() {
                continue;
            }
            let filter = grammar::build_clause(segment, MATCH_EXACT, &self.value(&row.label));
            if row.set_metadata_if_absent(SEGMENT_FILTER, filter) {
                annotated += 1;
            }
        }
        annotated
    }

    fn annotate_delimited(&self, table: &mut DataTable, delimiter: &str) -> usize {
        let mut annotated = 0;
        for row in table.rows.iter_mut() {
            if row.label.is_empty() {
                continue;
            }

            let parts: Vec<&str> = row.label.split(delimiter).collect();
            if parts.len() != self.segments.len() {
                log::debug!(
                    "Label '{}' has {} parts, expected {}; no segment filter derived",
                    row.label,
                    parts.len(),
                    self.segments.len()
                );
                continue;
            }

            let clauses: Vec<String> = self
                .segments
                .iter()
                .zip(parts)
                .filter(|(segment, _)| !segment.is_empty())
                .map(|(segment, part)| {
                    grammar::build_clause(segment, MATCH_EXACT, &self.value(part))
                })
                .collect();

            let filter = grammar::join_and(&clauses);
            if !filter.is_empty() && row.set_metadata_if_absent(SEGMENT_FILTER, filter) {
                annotated += 1;
            }
        }
        annotated
    }
}

impl RowFilterPass for SegmentFilter {
    fn name(&self) -> &'static str {
        "segment"
    }

    fn apply(&self, table: &mut DataTable) -> Result<usize, ConfigurationError> {
        let mode = self.mode()?;
        let mut annotated = 0;
        // Only `rows` is visited: the summary row never gets a filter here.
        table.walk_mut(&mut |t| {
            annotated += match mode {
                Mode::Single(segment) => self.annotate_single(t, segment),
                Mode::Delimited(delimiter) => self.annotate_delimited(t, delimiter),
            };
        });
        Ok(annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ReportRow;

    fn filters(table: &DataTable) -> Vec<Option<&str>> {
        table.rows.iter().map(|r| r.segment_filter()).collect()
    }

    #[test]
    fn test_single_segment_skips_empty_labels() {
        let mut table = DataTable::from_labels(&["Desktop", "", "Mobile"]);
        let annotated = SegmentFilter::single("deviceType").apply(&mut table).unwrap();

        assert_eq!(annotated, 2);
        assert_eq!(
            filters(&table),
            vec![Some("deviceType==Desktop"), None, Some("deviceType==Mobile")]
        );
    }

    #[test]
    fn test_single_segment_leaves_summary_row() {
        let mut table =
            DataTable::from_labels(&["Desktop"]).with_summary_row(ReportRow::new("Others"));
        SegmentFilter::single("deviceType").apply(&mut table).unwrap();

        let summary = table.summary_row.as_ref().unwrap();
        assert_eq!(summary.segment_filter(), None);
    }

    #[test]
    fn test_single_segment_label_not_escaped_by_default() {
        let mut table = DataTable::from_labels(&["a,b"]);
        SegmentFilter::single("ref").apply(&mut table).unwrap();
        assert_eq!(filters(&table), vec![Some("ref==a,b")]);

        let mut table = DataTable::from_labels(&["a,b"]);
        SegmentFilter::single("ref")
            .escape_labels(true)
            .apply(&mut table)
            .unwrap();
        assert_eq!(filters(&table), vec![Some("ref==a%2Cb")]);
    }

    #[test]
    fn test_empty_segment_key_is_a_configuration_error() {
        let mut table = DataTable::from_labels(&["Desktop"]);
        let result = SegmentFilter::single("").apply(&mut table);

        assert_eq!(result, Err(ConfigurationError::MissingSegments));
        assert_eq!(filters(&table), vec![None]);

        let empty: Vec<String> = Vec::new();
        let result = SegmentFilter::delimited(empty, "-").apply(&mut table);
        assert_eq!(result, Err(ConfigurationError::MissingSegments));
    }

    #[test]
    fn test_delimited_matching_arity() {
        let mut table = DataTable::from_labels(&["A-B", "A", "A-B-C"]);
        SegmentFilter::delimited(["dim1", "dim2"], "-")
            .apply(&mut table)
            .unwrap();

        assert_eq!(filters(&table), vec![Some("dim1==A;dim2==B"), None, None]);
    }

    #[test]
    fn test_delimited_skips_empty_segment_positions() {
        let mut table = DataTable::from_labels(&["Firefox 120 - Linux"]);
        SegmentFilter::delimited(["browserName", ""], " - ")
            .apply(&mut table)
            .unwrap();
        assert_eq!(filters(&table), vec![Some("browserName==Firefox 120")]);

        let mut table = DataTable::from_labels(&["A-B"]);
        let annotated = SegmentFilter::delimited(["", ""], "-")
            .apply(&mut table)
            .unwrap();
        assert_eq!(annotated, 0);
        assert_eq!(filters(&table), vec![None]);
    }

    #[test]
    fn test_delimited_without_delimiter_touches_nothing() {
        let mut table = DataTable::from_labels(&["A-B", "C-D"]);
        let result = SegmentFilter::delimited(["dim1", "dim2"], "").apply(&mut table);

        assert_eq!(
            result,
            Err(ConfigurationError::MissingDelimiter {
                segments: vec!["dim1".to_string(), "dim2".to_string()]
            })
        );
        assert_eq!(filters(&table), vec![None, None]);
    }

    #[test]
    fn test_single_segment_descends_into_subtables() {
        let mut table = DataTable::new(vec![
            ReportRow::new("Fruits").with_subtable(DataTable::from_labels(&["Apple"])),
        ]);
        let annotated = SegmentFilter::single("category").apply(&mut table).unwrap();

        assert_eq!(annotated, 2);
        let child = table.row_at_path(&[0, 0]).unwrap();
        assert_eq!(child.segment_filter(), Some("category==Apple"));
    }
}
