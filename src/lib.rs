pub mod error;
pub mod io;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod stages;

pub use error::{NormalizeError, NormalizeResult};
pub use io::{
    load_state_lookup, parse_registry_file, parse_registry_json, write_csv, DataConfig,
    FetchClient,
};
pub use models::{CanonicalDate, Table};
pub use normalize::{
    earliest_authority_date, expand_categories, find_redundant_columns, flatten_objects,
    normalize_date, CategoryField,
};
pub use pipeline::{
    inspect_registry, run_generation, run_registry, GenerationPipelineConfig,
    RegistryPipelineConfig,
};
pub use stages::{
    execute_stage1, execute_stage2, execute_stage3, execute_stage4, Stage1Config, Stage2Config,
    Stage3Config,
};
