use serde_json::Value;
use tracing::info;

use crate::error::{NormalizeError, NormalizeResult};
use crate::models::{cell_text, CanonicalDate, Table};
use crate::normalize::{parse_authorities, resolve_record_date};

pub const DEFAULT_DATE_COLUMN: &str = "EarliestEnactedDate";

/// Configuration for Stage 2 date resolution
#[derive(Debug, Clone)]
pub struct Stage2Config {
    /// Start-date columns, tried in order; absent columns are ignored
    pub start_date_fields: Vec<String>,
    /// Column holding each record's list of legal authorities
    pub authorities_field: String,
    /// Name of the resolved date column
    pub output_column: String,
}

impl Default for Stage2Config {
    fn default() -> Self {
        Self {
            start_date_fields: vec![
                "startDate".to_string(),
                "startDateDisplay".to_string(),
                "startDateText".to_string(),
            ],
            authorities_field: "authorities".to_string(),
            output_column: DEFAULT_DATE_COLUMN.to_string(),
        }
    }
}

/// Result of Stage 2 date resolution
#[derive(Debug, Default)]
pub struct Stage2Result {
    /// Records that ended up with a known date
    pub resolved: usize,
    /// Records left as `unknown`
    pub unknown: usize,
}

/// Execute Stage 2: Date resolution
///
/// Writes one canonical date per record into `output_column`: the start
/// date when it parses, else the earliest authority date, else `unknown`.
/// The start-date and authorities columns are consumed.
pub fn execute_stage2(table: &mut Table, config: &Stage2Config) -> NormalizeResult<Stage2Result> {
    let authorities_index = table.require_column(&config.authorities_field)?;
    let start_indices: Vec<usize> = config
        .start_date_fields
        .iter()
        .filter_map(|field| table.column_index(field))
        .collect();

    let mut result = Stage2Result::default();
    let mut dates = Vec::with_capacity(table.row_count());

    for (row_index, row) in table.rows().iter().enumerate() {
        let cell = &row[authorities_index];
        let authorities = parse_authorities(cell).map_err(|reason| match cell {
            Value::String(text) => NormalizeError::InputFormat {
                column: config.authorities_field.clone(),
                row: row_index,
                text: text.clone(),
                reason,
            },
            _ => NormalizeError::Schema {
                column: config.authorities_field.clone(),
                row: row_index,
                details: reason,
            },
        })?;

        let start_texts: Vec<_> = start_indices.iter().map(|&i| cell_text(&row[i])).collect();
        let date = resolve_record_date(start_texts.iter().map(|t| t.as_ref()), &authorities);

        if date.is_known() {
            result.resolved += 1;
        } else {
            result.unknown += 1;
        }
        dates.push(Value::String(date.to_string()));
    }

    table.set_column(&config.output_column, dates);
    table.drop_columns(&config.start_date_fields);
    table.drop_columns(&[config.authorities_field.as_str()]);

    info!(
        "Resolved {} dates, {} left as '{}'",
        result.resolved,
        result.unknown,
        CanonicalDate::UNKNOWN_LABEL
    );

    Ok(result)
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
    fn test_stage2_resolves_and_consumes_sources() {
        let mut t = table(json!([
            {"name": "a", "startDate": "03/01/2015",
             "authorities": [{"enactedDate": "01/15/2010"}]},
            {"name": "b", "startDate": "",
             "authorities": [{"enactedDate": "01/15/2010"}, {"effectiveText": "2008"}]},
            {"name": "c", "startDate": null, "authorities": []},
            {"name": "d", "startDate": "", "authorities": "[{'enactedText': '6/1/2012'}]"}
        ]));

        let result = execute_stage2(&mut t, &Stage2Config::default()).unwrap();

        assert_eq!(result.resolved, 3);
        assert_eq!(result.unknown, 1);
        assert_eq!(t.columns(), &["name", DEFAULT_DATE_COLUMN]);
        let dates: Vec<&Value> = t.column_values(1).collect();
        assert_eq!(
            dates,
            vec![&json!("2015/03/01"), &json!("2008"), &json!("unknown"), &json!("2012/06/01")]
        );
    }

    #[test]
    fn test_stage2_requires_authorities_column() {
        let mut t = table(json!([{"name": "a", "startDate": "2010"}]));
        let err = execute_stage2(&mut t, &Stage2Config::default()).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingColumn(ref c) if c == "authorities"));
    }

    #[test]
    fn test_stage2_rejects_malformed_authorities() {
        let mut t = table(json!([{"authorities": "[{'enactedDate': "}]));
        let err = execute_stage2(&mut t, &Stage2Config::default()).unwrap_err();
        assert!(matches!(err, NormalizeError::InputFormat { row: 0, .. }));
    }
}
