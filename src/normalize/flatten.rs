use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{NormalizeError, NormalizeResult};
use crate::models::Table;

use super::literal::decode_literal;

/// Suffix the registry puts on fields that hold a nested object
pub const OBJECT_SUFFIX: &str = "Obj";

/// Result of flattening nested object columns
#[derive(Debug, Default)]
pub struct FlattenResult {
    /// Generated columns, in creation order
    pub generated: Vec<String>,
    /// Generated names that replaced an existing column
    pub overwritten: Vec<String>,
    /// Requested fields that were not in the table
    pub skipped: Vec<String>,
}

/// Column prefix for a nested field: `stateObj` -> `state`
pub fn column_prefix(field: &str) -> &str {
    field.strip_suffix(OBJECT_SUFFIX).unwrap_or(field)
}

/// Promote every key of the named nested-object columns to its own column
///
/// The sub-keys come from the first row's mapping; rows lacking a key, or
/// holding null instead of a mapping, get `Null`. Textual mappings are
/// decoded first. The nested columns are removed afterwards. A field that
/// is not in the table is skipped, so flattening an already-flat table is a
/// no-op. When a generated name matches an existing column the new values
/// win and a warning is logged.
pub fn flatten_objects<S: AsRef<str>>(
    table: &mut Table,
    nested_fields: &[S],
) -> NormalizeResult<FlattenResult> {
    let mut result = FlattenResult::default();

    for field in nested_fields {
        let field = field.as_ref();
        let Some(values) = table.take_column(field) else {
            debug!("No column '{}' to flatten", field);
            result.skipped.push(field.to_string());
            continue;
        };

        let mappings = decode_mappings(field, values)?;
        let sub_keys = schema_keys(field, &mappings)?;
        let prefix = column_prefix(field);
        let generated_before = result.generated.len();

        for key in sub_keys {
            let column: Vec<Value> = mappings
                .iter()
                .map(|m| {
                    m.as_ref()
                        .and_then(|m| m.get(&key))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect();

            let name = format!("{}_{}", prefix, key);
            if table.set_column(&name, column) {
                warn!("Column '{}' from '{}' overwrote an existing column", name, field);
                result.overwritten.push(name.clone());
            }
            result.generated.push(name);
        }

        debug!(
            "Flattened '{}' into {} columns",
            field,
            result.generated.len() - generated_before
        );
    }

    Ok(result)
}

/// Turn each cell into a mapping, or `None` for a null cell
fn decode_mappings(
    field: &str,
    values: Vec<Value>,
) -> NormalizeResult<Vec<Option<Map<String, Value>>>> {
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(map)),
            Value::String(text) => match decode_literal(&text) {
                Ok(Value::Object(map)) => Ok(Some(map)),
                Ok(Value::Null) => Ok(None),
                Ok(other) => Err(NormalizeError::Schema {
                    column: field.to_string(),
                    row,
                    details: format!("expected a mapping, decoded {}", other),
                }),
                Err(reason) => Err(NormalizeError::InputFormat {
                    column: field.to_string(),
                    row,
                    text,
                    reason,
                }),
            },
            other => Err(NormalizeError::Schema {
                column: field.to_string(),
                row,
                details: format!("expected a mapping, found {}", other),
            }),
        })
        .collect()
}

/// Sub-keys to promote, read from the first row
fn schema_keys(
    field: &str,
    mappings: &[Option<Map<String, Value>>],
) -> NormalizeResult<Vec<String>> {
    match mappings.first() {
        None => Ok(Vec::new()),
        Some(Some(first)) => Ok(first.keys().cloned().collect()),
        Some(None) => Err(NormalizeError::Schema {
            column: field.to_string(),
            row: 0,
            details: "first record has no mapping to take sub-keys from".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(value: Value) -> Table {
        let records = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect();
        Table::from_records(records)
    }

    #[test]
    fn test_column_prefix() {
        assert_eq!(column_prefix("stateObj"), "state");
        assert_eq!(column_prefix("sector"), "sector");
    }

    #[test]
    fn test_flatten_promotes_keys() {
        let mut t = table(json!([
            {"name": "A", "stateObj": {"id": 44, "abbreviation": "TX"}},
            {"name": "B", "stateObj": {"id": 5}},
            {"name": "C", "stateObj": null}
        ]));

        let result = flatten_objects(&mut t, &["stateObj"]).unwrap();

        assert_eq!(result.generated, vec!["state_id", "state_abbreviation"]);
        assert_eq!(t.columns(), &["name", "state_id", "state_abbreviation"]);
        assert_eq!(t.rows()[0], vec![json!("A"), json!(44), json!("TX")]);
        assert_eq!(t.rows()[1], vec![json!("B"), json!(5), Value::Null]);
        assert_eq!(t.rows()[2], vec![json!("C"), Value::Null, Value::Null]);
    }

    #[test]
    fn test_flatten_decodes_textual_mappings() {
        let mut t = table(json!([
            {"typeObj": "{'id': 1, 'name': 'Rebate'}"},
            {"typeObj": "{\"id\": 2, \"name\": \"Loan\"}"}
        ]));

        flatten_objects(&mut t, &["typeObj"]).unwrap();

        assert_eq!(t.columns(), &["type_id", "type_name"]);
        assert_eq!(t.cell(1, "type_name"), Some(&json!("Loan")));
    }

    #[test]
    fn test_flatten_rejects_undecodable_text() {
        let mut t = table(json!([
            {"typeObj": {"id": 1}},
            {"typeObj": "{'id': "}
        ]));

        let err = flatten_objects(&mut t, &["typeObj"]).unwrap_err();
        assert!(matches!(err, NormalizeError::InputFormat { row: 1, .. }));
    }

    #[test]
    fn test_flatten_rejects_scalars() {
        let mut t = table(json!([{"sectorObj": 7}]));
        let err = flatten_objects(&mut t, &["sectorObj"]).unwrap_err();
        assert!(matches!(err, NormalizeError::Schema { .. }));
    }

    #[test]
    fn test_flatten_is_noop_on_flat_table() {
        let mut t = table(json!([
            {"name": "A", "state_id": 1},
            {"name": "B", "state_id": 2}
        ]));
        let before = t.clone();

        let result = flatten_objects(&mut t, &["stateObj", "typeObj"]).unwrap();

        assert_eq!(t, before);
        assert!(result.generated.is_empty());
        assert_eq!(result.skipped.len(), 2);
    }

    #[test]
    fn test_collision_last_write_wins() {
        let mut t = table(json!([
            {"state_id": "old", "stateObj": {"id": "new"}}
        ]));

        let result = flatten_objects(&mut t, &["stateObj"]).unwrap();

        assert_eq!(result.overwritten, vec!["state_id"]);
        assert_eq!(t.columns(), &["state_id"]);
        assert_eq!(t.cell(0, "state_id"), Some(&json!("new")));
    }
}
