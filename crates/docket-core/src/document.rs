//! The row view returned by document queries.

use std::collections::BTreeMap;

use crate::column::PRIMARY_KEY;
use crate::value::Value;

/// A decoded document row: the primary key plus one cell per declared column.
///
/// Cells that are null in the store are present here as [`Value::Null`], so
/// `get` distinguishes "column unknown" (`None`) from "no value"
/// (`Some(&Value::Null)`). The primary key is addressable under its reserved
/// name like any other cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: String,
    cells: BTreeMap<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut cells = BTreeMap::new();
        cells.insert(PRIMARY_KEY.to_owned(), Value::String(id.clone()));
        Self { id, cells }
    }

    /// The primary-key value.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Looks up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    /// Inserts or replaces a cell.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.cells.insert(column.into(), value);
    }

    /// Iterates over (column, value) pairs in column-name order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }
}
