use crate::config::RecomposeRules;
use crate::table::DataTable;
use std::fmt;

/// Index of a table inside a [`DisplayTree`]
pub type TableId = usize;

/// Position of a displayed row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRef {
    pub table: TableId,
    pub row: usize,
}

impl RowRef {
    pub fn new(table: TableId, row: usize) -> Self {
        Self { table, row }
    }
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {}, row {}", self.table, self.row)
    }
}

/// A row as it is shown on screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayRow {
    /// Text shown, possibly truncated
    pub label: String,
    /// Untruncated text when `label` was shortened
    pub full_label: Option<String>,
    /// Depth in a flat sibling hierarchy
    pub level: Option<u32>,
    /// Placeholder shown for an empty sub-table
    pub no_data: bool,
    /// Sub-table opened below this row
    pub subtable: Option<TableId>,
}

impl DisplayRow {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn at_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn no_data(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            no_data: true,
            ..Self::default()
        }
    }

    pub fn with_full_label(mut self, full_label: impl Into<String>) -> Self {
        self.full_label = Some(full_label.into());
        self
    }

    /// Untruncated label
    pub fn text(&self) -> &str {
        self.full_label.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayTable {
    pub rows: Vec<DisplayRow>,
    /// Row that opened this table, `None` for the root table
    pub parent: Option<RowRef>,
}

/// Flat arena of displayed tables.
///
/// Tables refer to the row that opened them by index, so ascending from a
/// nested row never needs an owning back-reference. A child table is always
/// created after its parent, which keeps the parent links acyclic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTree {
    tables: Vec<DisplayTable>,
}

impl Default for DisplayTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayTree {
    /// A tree holding an empty root table
    pub fn new() -> Self {
        Self {
            tables: vec![DisplayTable::default()],
        }
    }

    pub fn root(&self) -> TableId {
        0
    }

    pub fn push_row(&mut self, table: TableId, row: DisplayRow) -> Option<RowRef> {
        let rows = &mut self.tables.get_mut(table)?.rows;
        rows.push(row);
        Some(RowRef::new(table, rows.len() - 1))
    }

    /// Open an (empty) sub-table below `parent`
    pub fn open_subtable(&mut self, parent: RowRef) -> Option<TableId> {
        self.row(parent)?;
        let id = self.tables.len();
        self.tables.push(DisplayTable {
            rows: Vec::new(),
            parent: Some(parent),
        });
        if let Some(row) = self.row_mut(parent) {
            row.subtable = Some(id);
        }
        Some(id)
    }

    pub fn table(&self, id: TableId) -> Option<&DisplayTable> {
        self.tables.get(id)
    }

    pub fn row(&self, at: RowRef) -> Option<&DisplayRow> {
        self.tables.get(at.table)?.rows.get(at.row)
    }

    fn row_mut(&mut self, at: RowRef) -> Option<&mut DisplayRow> {
        self.tables.get_mut(at.table)?.rows.get_mut(at.row)
    }

    pub fn parent(&self, table: TableId) -> Option<RowRef> {
        self.tables.get(table)?.parent
    }

    pub fn tables_count(&self) -> usize {
        self.tables.len()
    }

    /// Follow row indices through opened sub-tables, e.g. `[0, 2]`
    pub fn resolve_path(&self, path: &[usize]) -> Option<RowRef> {
        let (first, rest) = path.split_first()?;
        let mut at = RowRef::new(self.root(), *first);
        self.row(at)?;
        for idx in rest {
            let table = self.row(at)?.subtable?;
            at = RowRef::new(table, *idx);
            self.row(at)?;
        }
        Some(at)
    }

    /// Lay out a report table the way it is displayed: every sub-table is
    /// expanded, empty ones show a "no data" row and long labels are
    /// truncated.
    pub fn from_data_table(table: &DataTable, rules: &RecomposeRules) -> Self {
        let mut tree = Self::new();
        let root = tree.root();
        tree.append_table(root, table, rules);
        tree
    }

    fn append_table(&mut self, id: TableId, table: &DataTable, rules: &RecomposeRules) {
        for source in &table.rows {
            let mut row = truncated_row(&source.label, rules);
            row.level = source.level;
            let Some(at) = self.push_row(id, row) else {
                return;
            };

            if let Some(subtable) = &source.subtable
                && let Some(child) = self.open_subtable(at)
            {
                if subtable.is_empty() {
                    self.push_row(child, DisplayRow::no_data(rules.no_data_label.clone()));
                } else {
                    self.append_table(child, subtable, rules);
                }
            }
        }
    }
}

fn truncated_row(label: &str, rules: &RecomposeRules) -> DisplayRow {
    match rules.max_label_length {
        Some(max) if label.chars().count() > max => {
            let mut shown: String = label.chars().take(max).collect();
            shown.push_str(&rules.truncation_marker);
            DisplayRow::new(shown).with_full_label(label)
        }
        _ => DisplayRow::new(label),
    }
}
