use tracing::info;

use crate::error::NormalizeResult;
use crate::models::Table;
use crate::normalize::{expand_categories, flatten_objects, CategoryField};

/// Configuration for Stage 1 flattening
#[derive(Debug, Clone)]
pub struct Stage1Config {
    /// Nested-object columns to promote into `<prefix>_<key>` columns
    pub nested_fields: Vec<String>,
    /// List-of-tag columns to expand into indicator columns
    pub categories: Vec<CategoryField>,
}

impl Default for Stage1Config {
    fn default() -> Self {
        Self {
            nested_fields: vec![
                "stateObj".to_string(),
                "typeObj".to_string(),
                "categoryObj".to_string(),
                "sectorObj".to_string(),
            ],
            categories: vec![
                CategoryField::new("sectors", "id", "Sector"),
                CategoryField::new("technologies", "categoryId", "Tech"),
            ],
        }
    }
}

/// Result of Stage 1 flattening
#[derive(Debug, Default)]
pub struct Stage1Result {
    /// Columns promoted out of nested objects
    pub flattened_columns: Vec<String>,
    /// Indicator columns created from tag lists
    pub indicator_columns: Vec<String>,
    /// Promoted columns that replaced an existing one
    pub overwritten: Vec<String>,
}

/// Execute Stage 1: Flattening
///
/// 1. Promotes nested-object fields to top-level columns
/// 2. Expands each tag list into one 0/1 column per id seen in the dataset
pub fn execute_stage1(table: &mut Table, config: &Stage1Config) -> NormalizeResult<Stage1Result> {
    let flatten = flatten_objects(table, &config.nested_fields)?;
    info!(
        "Flattened {} nested fields into {} columns",
        config.nested_fields.len() - flatten.skipped.len(),
        flatten.generated.len()
    );

    let mut indicator_columns = Vec::new();
    for field in &config.categories {
        let expansion = expand_categories(table, field)?;
        info!(
            "Expanded '{}' into {} indicator columns",
            field.list_field,
            expansion.columns.len()
        );
        indicator_columns.extend(expansion.columns);
    }

    Ok(Stage1Result {
        flattened_columns: flatten.generated,
        indicator_columns,
        overwritten: flatten.overwritten,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_registry_json;

    #[test]
    fn test_stage1_flattens_and_expands() {
        let json = br#"{
            "data": [
                {
                    "name": "Solar Rebate",
                    "stateObj": {"id": 44, "abbreviation": "TX"},
                    "typeObj": {"id": 3, "name": "Rebate"},
                    "sectors": [{"id": 1}, {"id": 4}],
                    "technologies": [{"categoryId": 7}]
                },
                {
                    "name": "Wind Credit",
                    "stateObj": {"id": 5, "abbreviation": "CA"},
                    "typeObj": {"id": 9, "name": "Credit"},
                    "sectors": [],
                    "technologies": [{"categoryId": 2}, {"categoryId": 7}]
                }
            ]
        }"#;

        let mut table = parse_registry_json(json).unwrap();
        let result = execute_stage1(&mut table, &Stage1Config::default()).unwrap();

        assert_eq!(
            result.flattened_columns,
            vec!["state_id", "state_abbreviation", "type_id", "type_name"]
        );
        assert_eq!(
            result.indicator_columns,
            vec!["Sector_1", "Sector_4", "Tech_2", "Tech_7"]
        );
        assert_eq!(
            table.columns(),
            &[
                "name",
                "state_id",
                "state_abbreviation",
                "type_id",
                "type_name",
                "Sector_1",
                "Sector_4",
                "Tech_2",
                "Tech_7"
            ]
        );
        assert_eq!(table.cell(1, "Tech_7"), Some(&serde_json::json!(1)));
        assert_eq!(table.cell(1, "Sector_1"), Some(&serde_json::json!(0)));
    }

    #[test]
    fn test_stage1_requires_tag_lists() {
        let json = br#"{"data": [{"name": "No tags", "stateObj": {"id": 1}}]}"#;
        let mut table = parse_registry_json(json).unwrap();
        assert!(execute_stage1(&mut table, &Stage1Config::default()).is_err());
    }
}
