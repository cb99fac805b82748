//! Application configuration for the parts catalog.
//!
//! User config lives at `~/.partscatalog/partscatalog.toml` unless a path is
//! given explicitly. CLI flags override config file values, which override
//! defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CatalogError, Result};
use crate::types::Grammar;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "partscatalog.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".partscatalog";

// ---------------------------------------------------------------------------
// Config structs (matching partscatalog.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the catalog and the registry dump live.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Base URLs of the remote metadata sources.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Forge credentials settings.
    #[serde(default)]
    pub forge: ForgeConfig,

    /// Enrichment batching.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Classification overrides.
    #[serde(default)]
    pub classify: ClassifyConfig,

    /// Search-index export.
    #[serde(default)]
    pub index: IndexConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the catalog (`components/` and `data/` live below it).
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,

    /// Locally cached registry dump.
    #[serde(default = "default_registry_dump")]
    pub registry_dump: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            registry_dump: default_registry_dump(),
        }
    }
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("catalog")
}
fn default_registry_dump() -> PathBuf {
    PathBuf::from("catalog/data/npm.json")
}

/// `[endpoints]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Package registry metadata.
    #[serde(default = "default_registry_url")]
    pub registry: Url,

    /// Forge repository API (stars, languages).
    #[serde(default = "default_forge_url")]
    pub forge: Url,

    /// Download statistics over a date range.
    #[serde(default = "default_stats_url")]
    pub stats: Url,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            registry: default_registry_url(),
            forge: default_forge_url(),
            stats: default_stats_url(),
        }
    }
}

fn default_registry_url() -> Url {
    Url::parse("https://registry.npmjs.com/").expect("valid default registry URL")
}
fn default_forge_url() -> Url {
    Url::parse("https://api.github.com/repos/").expect("valid default forge URL")
}
fn default_stats_url() -> Url {
    Url::parse("http://npm-stat.com/downloads/range/").expect("valid default stats URL")
}

/// `[forge]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Name of the env var holding the forge username.
    #[serde(default = "default_username_env")]
    pub username_env: String,

    /// Name of the env var holding the forge token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            username_env: default_username_env(),
            token_env: default_token_env(),
        }
    }
}

fn default_username_env() -> String {
    "GITHUB_USERNAME".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Number of components per slice when fetching in batches.
    #[serde(default = "default_slice_size")]
    pub slice_size: usize,

    /// Timeout for each remote request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            slice_size: default_slice_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_slice_size() -> usize {
    50
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[classify]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Only consider packages modified on or after this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<NaiveDate>,

    /// Grammar override for web components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_keywords: Option<Grammar>,

    /// Grammar override for native components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_keywords: Option<Grammar>,
}

/// `[index]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Records per upload batch.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}

// ---------------------------------------------------------------------------
// Forge credentials (runtime, resolved from the environment)
// ---------------------------------------------------------------------------

/// Basic-auth credentials for the forge API.
#[derive(Clone)]
pub struct ForgeCredentials {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for ForgeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForgeCredentials")
            .field("username", &self.username)
            .field("token", &"***")
            .finish()
    }
}

/// Read forge credentials from the env vars named in the config.
///
/// Returns `None` (requests go unauthenticated) when either is unset or empty.
pub fn forge_credentials(config: &AppConfig) -> Option<ForgeCredentials> {
    let read = |var: &str| std::env::var(var).ok().filter(|v| !v.is_empty());

    match (read(&config.forge.username_env), read(&config.forge.token_env)) {
        (Some(username), Some(token)) => Some(ForgeCredentials { username, token }),
        _ => {
            tracing::warn!(
                username_env = %config.forge.username_env,
                token_env = %config.forge.token_env,
                "forge credentials not set, requests will be rate-limited"
            );
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.partscatalog/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CatalogError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.partscatalog/partscatalog.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| CatalogError::config(format!("failed to parse {}: {e}", path.display())))?;

    validate_config(&config)?;
    Ok(config)
}

/// Reject values that would make a run meaningless.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.fetch.slice_size == 0 {
        return Err(CatalogError::config("fetch.slice_size must be at least 1"));
    }
    if config.index.chunk_size == 0 {
        return Err(CatalogError::config("index.chunk_size must be at least 1"));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CatalogError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CatalogError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CatalogError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
