//! Label recomposition
//!
//! Rebuilds the full hierarchical label of a displayed row: the labels of the
//! rows that opened its sub-tables, and of its ancestors in a flat leveled
//! hierarchy, followed by its own label.

use crate::config::RecomposeRules;
use crate::grammar;
use thiserror::Error;

mod tree;

pub use tree::{DisplayRow, DisplayTable, DisplayTree, RowRef, TableId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecomposeError {
    #[error("No displayed row at {0}")]
    UnknownRow(RowRef),
}

pub struct LabelRecomposer<'a> {
    tree: &'a DisplayTree,
    separator: String,
}

impl<'a> LabelRecomposer<'a> {
    pub fn new(tree: &'a DisplayTree, separator: impl Into<String>) -> Self {
        Self {
            tree,
            separator: separator.into(),
        }
    }

    pub fn with_rules(tree: &'a DisplayTree, rules: &RecomposeRules) -> Self {
        Self::new(tree, rules.recursive_label_separator.clone())
    }

    /// Full label of the row at `at`.
    ///
    /// Every step moves to an earlier sibling or to a shallower table, so the
    /// walk always ends; it does not modify the tree and can be repeated.
    pub fn recompose(&self, at: RowRef) -> Result<String, RecomposeError> {
        let mut current = at;
        let mut child_label: Option<String> = None;

        loop {
            let row = self
                .tree
                .row(current)
                .ok_or(RecomposeError::UnknownRow(current))?;

            let mut label = row.text().to_string();
            if let Some(child) = child_label.take() {
                label.push_str(&self.separator);
                label.push_str(&child);
            }

            match self.ascend(current, row) {
                Some(parent) => {
                    current = parent;
                    child_label = Some(label);
                }
                None => return Ok(label),
            }
        }
    }

    /// Expression matching the recomposed label of `at`
    pub fn segment_for(
        &self,
        at: RowRef,
        segment: &str,
        operator: &str,
    ) -> Result<String, RecomposeError> {
        let label = self.recompose(at)?;
        Ok(grammar::build_escaped_clause(segment, operator, &label))
    }

    /// The row one step up: the level ancestor if there is one, otherwise the
    /// row that opened the current table.
    fn ascend(&self, at: RowRef, row: &DisplayRow) -> Option<RowRef> {
        if let Some(level) = row.level.filter(|level| *level > 0)
            && let Some(ancestor) = self.level_ancestor(at, level - 1)
        {
            return Some(ancestor);
        }
        self.tree.parent(at.table)
    }

    /// Nearest preceding sibling at `level`, "no data" rows excluded
    fn level_ancestor(&self, at: RowRef, level: u32) -> Option<RowRef> {
        let siblings = &self.tree.table(at.table)?.rows;
        siblings
            .iter()
            .take(at.row)
            .enumerate()
            .rev()
            .find(|(_, sibling)| !sibling.no_data && sibling.level == Some(level))
            .map(|(idx, _)| RowRef::new(at.table, idx))
    }
}
