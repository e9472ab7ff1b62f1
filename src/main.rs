use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use energy_clean::{
    inspect_registry, run_generation, run_registry, DataConfig, FetchClient,
    GenerationPipelineConfig, RegistryPipelineConfig,
};

#[derive(Parser)]
#[command(name = "energy-clean")]
#[command(
    author,
    version,
    about = "Energy incentive registry and generation report cleaner",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the incentive registry and write a flat, deduplicated CSV
    Registry {
        /// Directory for cached payloads and output (overrides ENERGY_CLEAN_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Output CSV (defaults to <data-dir>/clean_registry.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV with `State` and `abbrev` columns for abbreviating state names
        #[arg(long)]
        state_lookup: Option<PathBuf>,

        /// Column of full state names to abbreviate
        #[arg(long, default_value = "state_name")]
        state_column: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Fetch the annual generation report and write a cleaned CSV
    Generation {
        /// Directory for cached payloads and output (overrides ENERGY_CLEAN_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Output CSV (defaults to <data-dir>/annual_generation_clean.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Summarize the raw registry without writing anything
    Inspect {
        /// Directory for cached payloads (overrides ENERGY_CLEAN_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Registry {
            data_dir,
            output,
            state_lookup,
            state_column,
            verbose,
        } => {
            setup_logging(verbose);
            let mut config = RegistryPipelineConfig::new(&data_config(data_dir));
            if let Some(output) = output {
                config.output = output;
            }
            config.state_lookup = state_lookup;
            config.stage3.state_column = state_column;
            clean_registry(config).await
        }
        Commands::Generation {
            data_dir,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            let mut config = GenerationPipelineConfig::new(&data_config(data_dir));
            if let Some(output) = output {
                config.output = output;
            }
            clean_generation_report(config).await
        }
        Commands::Inspect { data_dir, verbose } => {
            setup_logging(verbose);
            let config = RegistryPipelineConfig::new(&data_config(data_dir));
            inspect(config).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn data_config(data_dir: Option<PathBuf>) -> DataConfig {
    let mut config = DataConfig::from_env();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    config
}

async fn clean_registry(config: RegistryPipelineConfig) -> Result<()> {
    info!("Cleaning incentive registry from {}", config.source.url);
    let client = FetchClient::new();
    let report = run_registry(&client, &config).await?;

    info!(
        "Stage 1: {} flattened columns, {} indicator columns",
        report.stage1.flattened_columns.len(),
        report.stage1.indicator_columns.len()
    );
    info!(
        "Stage 2: {} dates resolved, {} unknown",
        report.stage2.resolved, report.stage2.unknown
    );
    info!(
        "Stage 3: {} duplicate and {} constant columns found",
        report.stage3.redundant.duplicates.len(),
        report.stage3.redundant.constants.len()
    );

    info!(
        "Complete: {} records, {} columns written to {:?}",
        report.stage4.rows, report.stage4.columns, report.stage4.path
    );

    Ok(())
}

async fn clean_generation_report(config: GenerationPipelineConfig) -> Result<()> {
    info!("Cleaning generation report from {}", config.source.url);
    let client = FetchClient::new();
    let report = run_generation(&client, &config).await?;

    info!(
        "Complete: {} rows written to {:?} ({} totals and {} incomplete rows dropped)",
        report.render.rows,
        report.render.path,
        report.cleaning.totals_dropped,
        report.cleaning.missing_dropped
    );

    Ok(())
}

async fn inspect(config: RegistryPipelineConfig) -> Result<()> {
    info!("Inspecting registry from {:?}", config.source.cache_path);
    let client = FetchClient::new();
    let report = inspect_registry(&client, &config).await?;

    println!("Registry Analysis");
    println!("=================");
    println!("Records: {}", report.records);
    println!("Raw fields: {}", report.raw_columns.len());
    println!("Columns after flattening: {}", report.prepared_columns.len());
    println!(
        "Dates: {} resolved, {} unknown",
        report.dates.resolved, report.dates.unknown
    );
    println!();

    println!("Raw Fields");
    println!("----------");
    for column in &report.raw_columns {
        println!("{}", column);
    }
    println!();

    println!("Redundant Columns");
    println!("-----------------");
    if report.redundant.is_empty() {
        println!("None");
    }
    for column in &report.redundant.duplicates {
        println!("{} (duplicate)", column);
    }
    for column in &report.redundant.constants {
        println!("{} (constant)", column);
    }

    Ok(())
}
