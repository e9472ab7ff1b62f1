use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{NormalizeError, NormalizeResult};

/// In-memory row-major table of JSON cells
///
/// Row order is the order records were read in and is never re-sorted.
/// `Value::Null` is the missing-value marker; nested cells stay
/// `Object`/`Array` until a flattening stage promotes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given header
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from JSON objects, one row per record
    ///
    /// The header is the union of keys in first-seen order. Records that
    /// lack a key get `Null` in that column.
    pub fn from_records(records: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for record in &records {
            for key in record.keys() {
                if !positions.contains_key(key) {
                    positions.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = vec![Value::Null; columns.len()];
                for (key, value) in record {
                    row[positions[&key]] = value;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Append a row, padding with `Null` or truncating to the header width
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of a column that a stage cannot run without
    pub fn require_column(&self, name: &str) -> NormalizeResult<usize> {
        self.column_index(name)
            .ok_or_else(|| NormalizeError::MissingColumn(name.to_string()))
    }

    /// Iterate one column top to bottom
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&Value> {
        let index = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[index])
    }

    /// Add a column at the end, or overwrite an existing column of that name
    ///
    /// Returns `true` when an existing column was overwritten.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> bool {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
                true
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
                false
            }
        }
    }

    /// Insert a new column at `position` (clamped to the header width)
    pub fn insert_column(&mut self, position: usize, name: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let position = position.min(self.columns.len());
        self.columns.insert(position, name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(position, value);
        }
    }

    /// Remove a column and hand back its values
    pub fn take_column(&mut self, name: &str) -> Option<Vec<Value>> {
        let index = self.column_index(name)?;
        self.columns.remove(index);
        Some(self.rows.iter_mut().map(|row| row.remove(index)).collect())
    }

    /// Drop every named column that is present; returns how many were dropped
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let doomed: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| names.iter().any(|n| n.as_ref() == c.as_str()))
            .map(|(i, _)| i)
            .collect();

        // Remove back to front so earlier indices stay valid
        for &index in doomed.iter().rev() {
            self.columns.remove(index);
            for row in &mut self.rows {
                row.remove(index);
            }
        }

        doomed.len()
    }

    /// Rename a column if present; returns whether it was found
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(index) => {
                self.columns[index] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Apply `f` to every cell of one column
    pub fn map_column<F>(&mut self, index: usize, mut f: F)
    where
        F: FnMut(&mut Value),
    {
        for row in &mut self.rows {
            f(&mut row[index]);
        }
    }

    /// Apply `f` to every cell in the table
    pub fn map_cells<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Value),
    {
        for cell in self.rows.iter_mut().flatten() {
            f(cell);
        }
    }

    /// Keep only rows for which `keep` returns true; returns rows removed
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[Value]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }

    /// Drop every row that still contains a missing value
    pub fn drop_rows_with_missing(&mut self) -> usize {
        self.retain_rows(|row| row.iter().all(|v| !is_missing(v)))
    }
}

/// `Null` is the only missing marker; JSON numbers cannot hold NaN
pub fn is_missing(value: &Value) -> bool {
    value.is_null()
}

/// Text form of a cell; missing values render empty, nested values as JSON
pub fn cell_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}
