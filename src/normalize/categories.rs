use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use tracing::debug;

use crate::error::{NormalizeError, NormalizeResult};
use crate::models::Table;

use super::literal::decode_literal;

/// Which list column to expand and how to name its indicators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryField {
    /// Column holding a list of tag objects
    pub list_field: String,
    /// Key inside each tag object that carries the id
    pub id_key: String,
    /// Indicator columns are named `<prefix>_<id>`
    pub prefix: String,
}

impl CategoryField {
    pub fn new(list_field: &str, id_key: &str, prefix: &str) -> Self {
        Self {
            list_field: list_field.to_string(),
            id_key: id_key.to_string(),
            prefix: prefix.to_string(),
        }
    }
}

/// Result of expanding one list column
#[derive(Debug)]
pub struct ExpansionResult {
    /// Indicator columns created, in id order
    pub columns: Vec<String>,
}

/// Replace a list-of-tags column with one 0/1 indicator column per id
///
/// Ids are collected over every row first, so the indicator set is the
/// same for all rows. Columns are appended in ascending id order (numeric
/// ids compare numerically). A null or blank cell is an empty list.
pub fn expand_categories(
    table: &mut Table,
    field: &CategoryField,
) -> NormalizeResult<ExpansionResult> {
    let values = table
        .take_column(&field.list_field)
        .ok_or_else(|| NormalizeError::MissingColumn(field.list_field.clone()))?;

    let per_row: Vec<Vec<String>> = values
        .into_iter()
        .enumerate()
        .map(|(row, cell)| row_ids(field, row, cell))
        .collect::<NormalizeResult<_>>()?;

    let universe: BTreeSet<&str> = per_row.iter().flatten().map(String::as_str).collect();
    let mut ids: Vec<&str> = universe.into_iter().collect();
    ids.sort_by(|a, b| compare_ids(a, b));

    let mut indicators: Vec<Vec<Value>> = vec![vec![Value::from(0); per_row.len()]; ids.len()];
    let position: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    for (row, row_ids) in per_row.iter().enumerate() {
        for id in row_ids {
            indicators[position[id.as_str()]][row] = Value::from(1);
        }
    }

    let mut columns = Vec::with_capacity(ids.len());
    for (id, values) in ids.iter().zip(indicators) {
        let name = format!("{}_{}", field.prefix, id);
        table.set_column(&name, values);
        columns.push(name);
    }

    debug!(
        "Expanded '{}' into {} indicator columns",
        field.list_field,
        columns.len()
    );

    Ok(ExpansionResult { columns })
}

/// Ids listed in one cell, rendered as text
fn row_ids(field: &CategoryField, row: usize, cell: Value) -> NormalizeResult<Vec<String>> {
    let schema_error = |details: String| NormalizeError::Schema {
        column: field.list_field.clone(),
        row,
        details,
    };

    let items = match cell {
        Value::Null => return Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::String(text) => match decode_literal(&text) {
            Ok(Value::Array(items)) => items,
            Ok(other) => return Err(schema_error(format!("expected a list, decoded {}", other))),
            Err(reason) => {
                return Err(NormalizeError::InputFormat {
                    column: field.list_field.clone(),
                    row,
                    text,
                    reason,
                });
            }
        },
        other => return Err(schema_error(format!("expected a list, found {}", other))),
    };

    items
        .iter()
        .map(|item| match item.get(&field.id_key) {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(schema_error(format!(
                "list element has no '{}': {}",
                field.id_key, item
            ))),
        })
        .collect()
}

/// Numeric ids sort numerically and before non-numeric ones
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
