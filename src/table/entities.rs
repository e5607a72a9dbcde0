use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fixed id of the summary row ("Others") of a table
pub const SUMMARY_ROW_ID: i64 = -1;

/// Metadata key holding the derived segment expression
pub const SEGMENT_FILTER: &str = "segmentFilter";
/// Metadata key holding the raw segment value provided by the query layer
pub const SEGMENT_VALUE: &str = "segmentValue";
/// Metadata key holding the raw value handed to client side visualizations
pub const PRESENTATION_VALUE: &str = "segment_value";
/// Metadata key holding the label before any formatting was applied
pub const ORIGINAL_LABEL: &str = "original_label";

/// Identifies a row inside its table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowId {
    Index(usize),
    Summary,
}

impl RowId {
    pub fn is_summary(&self) -> bool {
        matches!(self, RowId::Summary)
    }

    /// Numeric id, with the summary row mapped to [`SUMMARY_ROW_ID`]
    pub fn as_id(&self) -> i64 {
        match self {
            RowId::Index(idx) => *idx as i64,
            RowId::Summary => SUMMARY_ROW_ID,
        }
    }
}

/// A single row of a rendered report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRow {
    /// Display key of the row, may be empty
    #[serde(deserialize_with = "label_from_value")]
    pub label: String,
    /// Metric and dimension values
    pub columns: Map<String, Value>,
    /// Out-of-band annotations (segmentValue, segmentFilter, ...)
    pub metadata: Map<String, Value>,
    /// Nested table opened by this row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtable: Option<DataTable>,
    /// Depth in a flat sibling hierarchy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl ReportRow {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_subtable(mut self, subtable: DataTable) -> Self {
        self.subtable = Some(subtable);
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// String metadata value, `None` when absent or not a string
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn segment_filter(&self) -> Option<&str> {
        self.metadata_str(SEGMENT_FILTER)
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Write `value` under `key` unless a value is already present.
    ///
    /// Returns whether the value was written. A `null` entry counts as absent.
    pub fn set_metadata_if_absent(&mut self, key: &str, value: impl Into<Value>) -> bool {
        match self.metadata.get(key) {
            Some(existing) if !existing.is_null() => false,
            _ => {
                self.metadata.insert(key.to_string(), value.into());
                true
            }
        }
    }
}

/// A table of report rows with an optional summary row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTable {
    pub rows: Vec<ReportRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_row: Option<Box<ReportRow>>,
}

impl DataTable {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        Self {
            rows,
            summary_row: None,
        }
    }

    /// Build a table with one plain row per label
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        Self::new(labels.iter().map(|l| ReportRow::new(l.as_ref())).collect())
    }

    pub fn with_summary_row(mut self, row: ReportRow) -> Self {
        self.summary_row = Some(Box::new(row));
        self
    }

    /// Number of rows, the summary row excluded
    pub fn rows_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: RowId) -> Option<&ReportRow> {
        match id {
            RowId::Index(idx) => self.rows.get(idx),
            RowId::Summary => self.summary_row.as_deref(),
        }
    }

    /// All rows followed by the summary row, if any
    pub fn rows_with_summary(&self) -> impl Iterator<Item = (RowId, &ReportRow)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (RowId::Index(idx), row))
            .chain(self.summary_row.as_deref().map(|row| (RowId::Summary, row)))
    }

    /// Mutable variant of [`DataTable::rows_with_summary`]
    pub fn rows_with_summary_mut(&mut self) -> impl Iterator<Item = (RowId, &mut ReportRow)> + '_ {
        self.rows
            .iter_mut()
            .enumerate()
            .map(|(idx, row)| (RowId::Index(idx), row))
            .chain(
                self.summary_row
                    .as_deref_mut()
                    .map(|row| (RowId::Summary, row)),
            )
    }

    /// Visit this table and every nested sub-table, parents first. The
    /// summary row is never expanded, so its sub-table is not visited.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut DataTable)) {
        visit(self);
        for row in &mut self.rows {
            if let Some(subtable) = row.subtable.as_mut() {
                subtable.walk_mut(visit);
            }
        }
    }

    /// Resolve a row through sub-tables, e.g. `[0, 2]` is row 2 of the
    /// sub-table opened by row 0.
    pub fn row_at_path(&self, path: &[usize]) -> Option<&ReportRow> {
        let (first, rest) = path.split_first()?;
        let row = self.rows.get(*first)?;
        if rest.is_empty() {
            Some(row)
        } else {
            row.subtable.as_ref()?.row_at_path(rest)
        }
    }

    /// Every row of the tree with its path, depth first in display order
    pub fn flatten(&self) -> Vec<(String, &ReportRow)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a ReportRow)>) {
        for (id, row) in self.rows_with_summary() {
            let own = match id {
                RowId::Index(idx) => idx.to_string(),
                RowId::Summary => "summary".to_string(),
            };
            let path = if prefix.is_empty() {
                own
            } else {
                format!("{prefix}/{own}")
            };
            out.push((path.clone(), row));
            if let Some(subtable) = &row.subtable {
                subtable.flatten_into(&path, out);
            }
        }
    }
}

/// Labels arrive as strings or numbers depending on the report
fn label_from_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}
