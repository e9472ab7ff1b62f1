use serde_json::Value;
use tracing::{info, warn};

use crate::error::NormalizeResult;
use crate::models::Table;

/// Configuration for cleaning the annual generation report
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Report rows above the header that hold notes
    pub skip_rows: usize,
    /// Header renames, as (report header, column name)
    pub renames: Vec<(String, String)>,
    pub producer_column: String,
    /// Wordy producer types mapped to short names, matched after lowercasing
    pub producer_names: Vec<(String, String)>,
    pub energy_source_column: String,
    /// Energy source value marking per-state total rows
    pub total_label: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
            items
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect()
        }

        Self {
            skip_rows: 1,
            renames: pairs(&[
                ("STATE", "state"),
                ("TYPE OF PRODUCER", "producerType"),
                ("ENERGY SOURCE", "energySource"),
                ("YEAR", "year"),
                ("GENERATION (Megawatthours)", "genMWH"),
            ]),
            producer_column: "producerType".to_string(),
            producer_names: pairs(&[
                ("total electric power industry", "total"),
                ("electric generators, electric utilities", "utilities"),
                ("electric generators, independent power producers", "independent"),
                ("combined heat and power, industrial power", "industrial_chp"),
                ("combined heat and power, commercial power", "commercial_chp"),
                ("combined heat and power, electric power", "electric_chp"),
            ]),
            energy_source_column: "energySource".to_string(),
            total_label: "total".to_string(),
        }
    }
}

/// Result of cleaning the generation report
#[derive(Debug, Default)]
pub struct GenerationResult {
    /// Per-state total rows removed
    pub totals_dropped: usize,
    /// Rows removed for holding a missing value
    pub missing_dropped: usize,
}

/// Clean the generation report in place
///
/// Renames headers, lowercases and trims text, shortens producer types,
/// then drops total rows and rows with missing values.
pub fn clean_generation(
    table: &mut Table,
    config: &GenerationConfig,
) -> NormalizeResult<GenerationResult> {
    for (from, to) in &config.renames {
        table.rename_column(from, to);
    }

    table.map_cells(|cell| {
        if let Value::String(text) = cell {
            *text = text.trim().to_lowercase();
        }
    });

    let producer = table.require_column(&config.producer_column)?;
    table.map_column(producer, |cell| {
        if let Value::String(text) = cell {
            if let Some((_, short)) = config.producer_names.iter().find(|(long, _)| long == text) {
                *text = short.clone();
            }
        }
    });

    let source = table.require_column(&config.energy_source_column)?;
    let totals_dropped =
        table.retain_rows(|row| row[source].as_str() != Some(config.total_label.as_str()));

    let missing_dropped = table.drop_rows_with_missing();
    if missing_dropped > 0 {
        warn!("Dropped {} rows with missing values", missing_dropped);
    }

    info!(
        "Generation report: {} rows kept, {} totals dropped",
        table.row_count(),
        totals_dropped
    );

    Ok(GenerationResult {
        totals_dropped,
        missing_dropped,
    })
}
