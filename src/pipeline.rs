use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::io::{
    load_state_lookup, parse_generation_workbook, parse_registry_json, DataConfig, FetchClient,
    SourceConfig,
};
use crate::normalize::{find_redundant_columns, RedundantColumns};
use crate::stages::{
    clean_generation, execute_stage1, execute_stage2, execute_stage3, execute_stage4,
    GenerationConfig, GenerationResult, Stage1Config, Stage1Result, Stage2Config, Stage2Result,
    Stage3Config, Stage3Result, Stage4Result,
};

/// Everything the registry pipeline needs for one run
#[derive(Debug, Clone)]
pub struct RegistryPipelineConfig {
    pub source: SourceConfig,
    /// Where the cleaned CSV is written
    pub output: PathBuf,
    /// Optional `State,abbrev` CSV used to abbreviate state names
    pub state_lookup: Option<PathBuf>,
    pub stage1: Stage1Config,
    pub stage2: Stage2Config,
    pub stage3: Stage3Config,
}

impl RegistryPipelineConfig {
    pub fn new(data: &DataConfig) -> Self {
        Self {
            source: data.registry_source(),
            output: data.data_dir.join("clean_registry.csv"),
            state_lookup: None,
            stage1: Stage1Config::default(),
            stage2: Stage2Config::default(),
            stage3: Stage3Config::default(),
        }
    }

    /// Stage 3 settings with the resolved date column always protected
    fn prune_config(&self) -> Stage3Config {
        let mut stage3 = self.stage3.clone();
        if !stage3.protected.contains(&self.stage2.output_column) {
            stage3.protected.push(self.stage2.output_column.clone());
        }
        stage3
    }
}

/// Per-stage results of a registry run
#[derive(Debug)]
pub struct RegistryReport {
    pub records: usize,
    pub stage1: Stage1Result,
    pub stage2: Stage2Result,
    pub stage3: Stage3Result,
    pub stage4: Stage4Result,
}

/// Fetch (or load) the registry, clean it and write the CSV
///
/// Nothing is written unless every stage succeeds.
pub async fn run_registry(
    client: &FetchClient,
    config: &RegistryPipelineConfig,
) -> Result<RegistryReport> {
    // Read the lookup first so a bad file fails before any work
    let lookup = match &config.state_lookup {
        Some(path) => Some(load_state_lookup(path)?),
        None => None,
    };

    let raw = client.fetch_or_load(&config.source).await?;
    let mut table = parse_registry_json(&raw)?;
    let records = table.row_count();
    info!("Loaded {} registry records with {} fields", records, table.column_count());

    info!("Stage 1: Flattening nested fields...");
    let stage1 = execute_stage1(&mut table, &config.stage1).context("Stage 1 (flattening) failed")?;

    info!("Stage 2: Resolving dates...");
    let stage2 = execute_stage2(&mut table, &config.stage2).context("Stage 2 (dates) failed")?;

    info!("Stage 3: Pruning columns...");
    let stage3 = execute_stage3(&mut table, &config.prune_config(), lookup.as_ref())
        .context("Stage 3 (pruning) failed")?;

    info!("Stage 4: Rendering output...");
    let stage4 = execute_stage4(&table, &config.output)?;

    Ok(RegistryReport {
        records,
        stage1,
        stage2,
        stage3,
        stage4,
    })
}

/// Everything the generation pipeline needs for one run
#[derive(Debug, Clone)]
pub struct GenerationPipelineConfig {
    pub source: SourceConfig,
    pub output: PathBuf,
    pub cleaning: GenerationConfig,
}

impl GenerationPipelineConfig {
    pub fn new(data: &DataConfig) -> Self {
        Self {
            source: data.generation_source(),
            output: data.data_dir.join("annual_generation_clean.csv"),
            cleaning: GenerationConfig::default(),
        }
    }
}

#[derive(Debug)]
pub struct GenerationReport {
    pub cleaning: GenerationResult,
    pub render: Stage4Result,
}

/// Fetch (or load) the generation spreadsheet, clean it and write the CSV
pub async fn run_generation(
    client: &FetchClient,
    config: &GenerationPipelineConfig,
) -> Result<GenerationReport> {
    let path = client.ensure_cached(&config.source).await?;
    let mut table = parse_generation_workbook(&path, config.cleaning.skip_rows)?;
    info!("Loaded {} generation rows", table.row_count());

    let cleaning = clean_generation(&mut table, &config.cleaning)
        .context("Failed to clean generation report")?;
    let render = execute_stage4(&table, &config.output)?;

    Ok(GenerationReport { cleaning, render })
}

/// What a registry run would see, without writing anything
#[derive(Debug)]
pub struct InspectReport {
    pub records: usize,
    /// Top-level fields of the raw payload
    pub raw_columns: Vec<String>,
    /// Columns after flattening and date resolution
    pub prepared_columns: Vec<String>,
    pub dates: Stage2Result,
    pub redundant: RedundantColumns,
}

/// Run the flattening and date stages and report what deduplication would drop
pub async fn inspect_registry(
    client: &FetchClient,
    config: &RegistryPipelineConfig,
) -> Result<InspectReport> {
    let raw = client.fetch_or_load(&config.source).await?;
    let mut table = parse_registry_json(&raw)?;
    let raw_columns = table.columns().to_vec();

    execute_stage1(&mut table, &config.stage1).context("Stage 1 (flattening) failed")?;
    let dates = execute_stage2(&mut table, &config.stage2).context("Stage 2 (dates) failed")?;

    Ok(InspectReport {
        records: table.row_count(),
        raw_columns,
        prepared_columns: table.columns().to_vec(),
        dates,
        redundant: find_redundant_columns(&table),
    })
}
