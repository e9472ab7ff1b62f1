use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use serde::Deserialize;
use serde_json::Value;

use crate::error::NormalizeError;
use crate::models::{RegistryResponse, Table};

/// Parse a cached registry JSON file into a table
pub fn parse_registry_file(path: &Path) -> Result<Table> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_registry_json(&content)
}

/// Parse registry JSON bytes into one row per program
pub fn parse_registry_json(json: &[u8]) -> Result<Table> {
    let response: RegistryResponse =
        serde_json::from_slice(json).context("Failed to parse registry JSON")?;
    Ok(Table::from_records(response.data))
}

/// Read the first sheet of a generation report workbook
///
/// The first `skip_rows` rows are notes; the next row is the header.
pub fn parse_generation_workbook(path: &Path, skip_rows: usize) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {:?}", path))?;
    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("Workbook has no sheets: {:?}", path))?
        .with_context(|| format!("Failed to read first sheet of {:?}", path))?;

    sheet_to_table(range.rows(), skip_rows)
}

/// Build a table from spreadsheet rows, header after `skip_rows` notes
pub fn sheet_to_table<'a, I>(rows: I, skip_rows: usize) -> Result<Table>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let mut rows = rows.into_iter().skip(skip_rows);
    let header = rows.next().context("Sheet has no header row")?;
    let columns: Vec<String> = header.iter().map(header_name).collect();

    let mut table = Table::new(columns);
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        table.push_row(row.iter().map(cell_value).collect());
    }

    Ok(table)
}

/// Header text with runs of whitespace collapsed
fn header_name(cell: &Data) -> String {
    cell.to_string().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        other => Value::String(other.to_string()),
    }
}

/// Whole floats become integers, matching how the report stores years
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[derive(Debug, Deserialize)]
struct StateRow {
    #[serde(rename = "State")]
    state: String,
    abbrev: String,
}

/// Load the full-name to two-letter state lookup
///
/// Every name must appear once; the join is many-to-one.
pub fn load_state_lookup(path: &Path) -> Result<HashMap<String, String>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open state lookup: {:?}", path))?;
    read_state_lookup(reader)
}

fn read_state_lookup<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> Result<HashMap<String, String>> {
    let mut lookup = HashMap::new();
    for row in reader.deserialize() {
        let row: StateRow = row.context("Failed to parse state lookup row")?;
        if lookup.insert(row.state.clone(), row.abbrev).is_some() {
            return Err(NormalizeError::DuplicateLookupKey(row.state).into());
        }
    }
    Ok(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_registry_json() {
        let json = br#"{
            "data": [
                {"id": 1, "name": "Solar Rebate", "stateObj": {"abbreviation": "TX"}},
                {"id": 2, "name": "Wind Credit", "published": true}
            ]
        }"#;

        let table = parse_registry_json(json).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.columns(), &["id", "name", "stateObj", "published"]);
        assert_eq!(table.cell(0, "stateObj"), Some(&json!({"abbreviation": "TX"})));
        assert_eq!(table.cell(0, "published"), Some(&Value::Null));
    }

    #[test]
    fn test_parse_registry_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry_raw.json");
        std::fs::write(&path, r#"{"data": [{"id": 7}]}"#).unwrap();

        let table = parse_registry_file(&path).unwrap();
        assert_eq!(table.cell(0, "id"), Some(&json!(7)));

        assert!(parse_registry_file(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_parse_registry_json_without_data() {
        assert!(parse_registry_json(br#"{"records": []}"#).is_err());
    }

    #[test]
    fn test_sheet_to_table_skips_note() {
        let rows = vec![
            vec![Data::String("Note: preliminary data".to_string()), Data::Empty],
            vec![
                Data::String("YEAR".to_string()),
                Data::String("GENERATION\n(Megawatthours)".to_string()),
            ],
            vec![Data::Float(2001.0), Data::Float(1234.5)],
            vec![Data::Empty, Data::Empty],
            vec![Data::Int(2002), Data::String(" ".to_string())],
        ];

        let table = sheet_to_table(rows.iter().map(Vec::as_slice), 1).unwrap();

        assert_eq!(table.columns(), &["YEAR", "GENERATION (Megawatthours)"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0], vec![json!(2001), json!(1234.5)]);
        assert_eq!(table.rows()[1], vec![json!(2002), Value::Null]);
    }

    #[test]
    fn test_state_lookup() {
        let data = "State,abbrev,code\nTexas,TX,48\nOhio,OH,39\n";
        let lookup = read_state_lookup(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(lookup.get("Texas").map(String::as_str), Some("TX"));
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn test_state_lookup_rejects_duplicates() {
        let data = "State,abbrev\nTexas,TX\nTexas,TE\n";
        let err = read_state_lookup(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(err.to_string().contains("Texas"));
    }
}
