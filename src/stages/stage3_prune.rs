use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{NormalizeError, NormalizeResult};
use crate::models::Table;
use crate::normalize::{find_redundant_columns_excluding, RedundantColumns};

use super::stage2_dates::DEFAULT_DATE_COLUMN;

/// Configuration for Stage 3 pruning
#[derive(Debug, Clone)]
pub struct Stage3Config {
    /// Columns known to be useless for analysis
    pub drop_columns: Vec<String>,
    /// Fixed renames applied after dropping, as (from, to)
    pub renames: Vec<(String, String)>,
    /// Columns kept even when the deduplicator flags them
    pub protected: Vec<String>,
    /// Column of full state names replaced by abbreviations when a lookup is given
    pub state_column: String,
}

impl Default for Stage3Config {
    fn default() -> Self {
        let drop_columns = [
            "endDate",
            "endDateDisplay",
            "endDateText",
            "parameterSets",
            "lastUpdated",
            "additionalTechnologies",
            "summary",
            "websiteUrl",
            "administrator",
            "fundingSource",
            "budget",
            "type_categoryObj",
        ];
        Self {
            drop_columns: drop_columns.iter().map(|c| c.to_string()).collect(),
            renames: vec![
                ("updatedTs".to_string(), "lastUpdated".to_string()),
                ("createdTs".to_string(), "dateCreated".to_string()),
            ],
            protected: vec![DEFAULT_DATE_COLUMN.to_string()],
            state_column: "state_name".to_string(),
        }
    }
}

/// Result of Stage 3 pruning
#[derive(Debug, Default)]
pub struct Stage3Result {
    /// What the deduplicator flagged, before protection was applied
    pub redundant: RedundantColumns,
    /// Columns removed in total
    pub columns_dropped: usize,
    /// Renames that found their column
    pub columns_renamed: usize,
    /// Rows whose state name had no abbreviation, when a lookup was joined
    pub unmatched_states: Option<usize>,
}

/// Execute Stage 3: Pruning
///
/// 1. Drops identical and constant columns (except protected ones); the
///    known-useless columns take no part in this comparison
/// 2. Drops the known-useless columns that are still present
/// 3. Applies the fixed renames
/// 4. Optionally swaps full state names for abbreviations, placed second
pub fn execute_stage3(
    table: &mut Table,
    config: &Stage3Config,
    state_lookup: Option<&HashMap<String, String>>,
) -> NormalizeResult<Stage3Result> {
    let mut result = Stage3Result {
        redundant: find_redundant_columns_excluding(table, &config.drop_columns),
        ..Default::default()
    };

    let redundant: Vec<String> = result
        .redundant
        .all()
        .into_iter()
        .filter(|c| !is_protected(config, state_lookup.is_some(), c))
        .collect();
    debug!("Redundant columns: {:?}", redundant);
    result.columns_dropped += table.drop_columns(&redundant);

    result.columns_dropped += table.drop_columns(&config.drop_columns);

    for (from, to) in &config.renames {
        if table.rename_column(from, to) {
            result.columns_renamed += 1;
        }
    }

    if let Some(lookup) = state_lookup {
        let unmatched = join_state_abbreviations(table, &config.state_column, lookup)?;
        if unmatched > 0 {
            warn!("{} rows have a state name missing from the lookup", unmatched);
        }
        result.unmatched_states = Some(unmatched);
    }

    info!(
        "Dropped {} columns ({} redundant), renamed {}",
        result.columns_dropped,
        redundant.len(),
        result.columns_renamed
    );

    Ok(result)
}

fn is_protected(config: &Stage3Config, joining_states: bool, column: &str) -> bool {
    config.protected.iter().any(|p| p == column)
        || (joining_states && column == config.state_column)
}

/// Replace full state names with abbreviations and move the column to second place
///
/// Names are matched exactly; a name missing from the lookup becomes null.
/// Returns the number of unmatched rows.
pub fn join_state_abbreviations(
    table: &mut Table,
    column: &str,
    lookup: &HashMap<String, String>,
) -> NormalizeResult<usize> {
    let names = table
        .take_column(column)
        .ok_or_else(|| NormalizeError::MissingColumn(column.to_string()))?;

    let mut unmatched = 0;
    let abbreviations: Vec<Value> = names
        .iter()
        .map(|name| match name.as_str().and_then(|n| lookup.get(n)) {
            Some(abbrev) => Value::String(abbrev.clone()),
            None => {
                unmatched += 1;
                Value::Null
            }
        })
        .collect();

    table.insert_column(1, column, abbreviations);
    Ok(unmatched)
}
