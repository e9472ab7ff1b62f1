use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};

/// Every program in one page, with the column and ordering query the
/// registry's own table view sends
pub const DEFAULT_REGISTRY_URL: &str = concat!(
    "https://programs.dsireusa.org/api/v1/programs?&draw=3",
    "&columns%5B0%5D%5Bdata%5D=name&columns%5B0%5D%5Bname%5D=",
    "&columns%5B0%5D%5Bsearchable%5D=true&columns%5B0%5D%5Borderable%5D=true",
    "&columns%5B0%5D%5Bsearch%5D%5Bvalue%5D=&columns%5B0%5D%5Bsearch%5D%5Bregex%5D=false",
    "&columns%5B1%5D%5Bdata%5D=stateObj.abbreviation&columns%5B1%5D%5Bname%5D=",
    "&columns%5B1%5D%5Bsearchable%5D=true&columns%5B1%5D%5Borderable%5D=true",
    "&columns%5B1%5D%5Bsearch%5D%5Bvalue%5D=&columns%5B1%5D%5Bsearch%5D%5Bregex%5D=false",
    "&columns%5B2%5D%5Bdata%5D=categoryObj.name&columns%5B2%5D%5Bname%5D=",
    "&columns%5B2%5D%5Bsearchable%5D=true&columns%5B2%5D%5Borderable%5D=true",
    "&columns%5B2%5D%5Bsearch%5D%5Bvalue%5D=&columns%5B2%5D%5Bsearch%5D%5Bregex%5D=false",
    "&columns%5B3%5D%5Bdata%5D=typeObj.name&columns%5B3%5D%5Bname%5D=",
    "&columns%5B3%5D%5Bsearchable%5D=true&columns%5B3%5D%5Borderable%5D=true",
    "&columns%5B3%5D%5Bsearch%5D%5Bvalue%5D=&columns%5B3%5D%5Bsearch%5D%5Bregex%5D=false",
    "&columns%5B4%5D%5Bdata%5D=published&columns%5B4%5D%5Bname%5D=",
    "&columns%5B4%5D%5Bsearchable%5D=true&columns%5B4%5D%5Borderable%5D=true",
    "&columns%5B4%5D%5Bsearch%5D%5Bvalue%5D=&columns%5B4%5D%5Bsearch%5D%5Bregex%5D=false",
    "&columns%5B5%5D%5Bdata%5D=createdTs&columns%5B5%5D%5Bname%5D=",
    "&columns%5B5%5D%5Bsearchable%5D=true&columns%5B5%5D%5Borderable%5D=true",
    "&columns%5B5%5D%5Bsearch%5D%5Bvalue%5D=&columns%5B5%5D%5Bsearch%5D%5Bregex%5D=false",
    "&columns%5B6%5D%5Bdata%5D=updatedTs&columns%5B6%5D%5Bname%5D=",
    "&columns%5B6%5D%5Bsearchable%5D=true&columns%5B6%5D%5Borderable%5D=true",
    "&columns%5B6%5D%5Bsearch%5D%5Bvalue%5D=&columns%5B6%5D%5Bsearch%5D%5Bregex%5D=false",
    "&order%5B0%5D%5Bcolumn%5D=6&order%5B0%5D%5Bdir%5D=desc",
    "&start=0&length=-1&search%5Bvalue%5D=&search%5Bregex%5D=false"
);

pub const DEFAULT_GENERATION_URL: &str =
    "https://www.eia.gov/electricity/data/state/annual_generation_state.xls";

/// Where raw payloads come from and where they are cached
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Directory for cached payloads and cleaned output
    pub data_dir: PathBuf,
    /// Incentive registry endpoint
    pub registry_url: String,
    /// Generation report download
    pub generation_url: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            generation_url: DEFAULT_GENERATION_URL.to_string(),
        }
    }
}

impl DataConfig {
    /// Defaults, overridden by `ENERGY_CLEAN_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("ENERGY_CLEAN_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            registry_url: std::env::var("ENERGY_CLEAN_REGISTRY_URL")
                .unwrap_or(defaults.registry_url),
            generation_url: std::env::var("ENERGY_CLEAN_GENERATION_URL")
                .unwrap_or(defaults.generation_url),
        }
    }

    pub fn registry_source(&self) -> SourceConfig {
        SourceConfig {
            url: self.registry_url.clone(),
            cache_path: self.data_dir.join("registry_raw.json"),
        }
    }

    pub fn generation_source(&self) -> SourceConfig {
        SourceConfig {
            url: self.generation_url.clone(),
            cache_path: self.data_dir.join("annual_generation_raw.xls"),
        }
    }
}

/// One remote payload and its local cache file
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: String,
    pub cache_path: PathBuf,
}

/// Downloads raw payloads, reading the cache instead when it exists
pub struct FetchClient {
    client: Client,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Make sure the cache file exists, downloading it if needed
    pub async fn ensure_cached(&self, source: &SourceConfig) -> Result<PathBuf> {
        if tokio::fs::try_exists(&source.cache_path)
            .await
            .with_context(|| format!("Failed to check cache file: {:?}", source.cache_path))?
        {
            debug!("Using cached payload {:?}", source.cache_path);
            return Ok(source.cache_path.clone());
        }

        info!("Downloading {}", source.url);
        let bytes = self.download(&source.url).await?;
        write_cache(&source.cache_path, &bytes).await?;
        info!("Cached {} bytes to {:?}", bytes.len(), source.cache_path);

        Ok(source.cache_path.clone())
    }

    /// Raw payload bytes, from the cache or the network
    pub async fn fetch_or_load(&self, source: &SourceConfig) -> Result<Vec<u8>> {
        let path = self.ensure_cached(source).await?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read file: {:?}", path))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Download of {} failed: {} - {}", url, status, body);
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        Ok(bytes.to_vec())
    }
}

async fn write_cache(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write cache file: {:?}", path))
}
