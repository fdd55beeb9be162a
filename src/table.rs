//! In-memory tabular input
//!
//! The engine accepts any tabular data that can be materialized as ordered
//! column names plus string-valued rows. Format parsing (CSV, Excel, ...)
//! is an external collaborator; this is the fixed contract it must satisfy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaProblem;

/// Which input table a row or problem belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Flow,
    Firewall,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::Flow => write!(f, "flow"),
            TableKind::Firewall => write!(f, "firewall"),
        }
    }
}

/// Raw tabular data: column headers plus string-valued rows.
///
/// Rows may be ragged; a cell beyond a row's length reads as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<S: Into<String>>(&mut self, row: Vec<S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column-name to position lookup for one validated table.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Cell value for `column` in `row`, if the column exists and the row
    /// reaches it. Used for both required and tolerate-if-absent columns.
    pub fn value<'a>(&self, row: &'a [String], column: &str) -> Option<&'a str> {
        let pos = *self.positions.get(column)?;
        row.get(pos).map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }
}

/// Check that every required column is present, scanning once and reporting
/// the full missing set in the problem rather than just the first hit.
pub fn validate_schema(
    table: &RawTable,
    kind: TableKind,
    required: &[String],
) -> std::result::Result<ColumnIndex, SchemaProblem> {
    let positions: HashMap<String, usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|c| !positions.contains_key(c.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(ColumnIndex { positions })
    } else {
        Err(SchemaProblem {
            table: kind,
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reports_all_missing_columns_at_once() {
        let table = RawTable::new(vec!["timestamp", "src_ip"]);
        let err = validate_schema(
            &table,
            TableKind::Flow,
            &required(&["timestamp", "src_ip", "dst_ip", "bytes"]),
        )
        .unwrap_err();

        assert_eq!(err.table, TableKind::Flow);
        assert_eq!(err.missing, vec!["dst_ip".to_string(), "bytes".to_string()]);
    }

    #[test]
    fn index_reads_cells_and_tolerates_ragged_rows() {
        let mut table = RawTable::new(vec!["a", "b", "c"]);
        table.push_row(vec!["1", "2", "3"]);
        table.push_row(vec!["1"]);

        let idx = validate_schema(&table, TableKind::Flow, &required(&["a", "b"])).unwrap();
        assert_eq!(idx.value(&table.rows[0], "c"), Some("3"));
        assert_eq!(idx.value(&table.rows[1], "b"), None);
        assert_eq!(idx.value(&table.rows[0], "missing"), None);
        assert!(!idx.has_column("protocol"));
    }
}
