//! Configuration module for the code-intelligence cache.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CS_` and use double underscores
//! to separate nested levels:
//! - `CS_INDEXING__BATCH_SIZE=10` sets `indexing.batch_size`
//! - `CS_EMBEDDING__MODEL_ENABLED=false` sets `embedding.model_enabled`
//! - `CS_SEARCH__DEFAULT_LIMIT=10` sets `search.default_limit`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-project directory holding settings and the cache database
pub const CONFIG_DIR: &str = ".codesense";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Path to the SQLite cache database
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Workspace root directory (where .codesense is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Directory scanning and batching
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Feature embedder settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Similarity and relationship query settings
    #[serde(default)]
    pub search: SearchConfig,

    /// File watching settings
    #[serde(default)]
    pub file_watch: FileWatchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Upper bound on worker threads used inside one batch
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Files processed per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,

    /// Maximum number of files a directory scan returns
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Source extensions picked up by a directory scan (without the dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names never descended into. Hidden directories are always skipped.
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Try the model-backed embedder before the heuristic one
    #[serde(default = "default_true")]
    pub model_enabled: bool,

    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Content is truncated to this many characters before embedding
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Number of results returned when the caller gives no limit
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,

    /// Relationship types returned by `related` when none are requested
    #[serde(default = "default_related_types")]
    pub related_types: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FileWatchConfig {
    /// Evict cached entries when watched files change
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Debounce interval in milliseconds (default: 500ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_database_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("cache.db")
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_batch_size() -> usize {
    5
}
fn default_batch_pause_ms() -> u64 {
    50
}
fn default_max_files() -> usize {
    200
}
fn default_extensions() -> Vec<String> {
    ["js", "ts", "tsx", "jsx", "py", "java", "cpp", "c", "go", "rs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_excluded_dirs() -> Vec<String> {
    ["node_modules", "dist", "build"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_max_input_chars() -> usize {
    4000
}
fn default_search_limit() -> usize {
    5
}
fn default_related_types() -> Vec<String> {
    vec![
        "import".to_string(),
        "inheritance".to_string(),
        "implementation".to_string(),
    ]
}
fn default_debounce_ms() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            database_path: default_database_path(),
            workspace_root: None,
            debug: false,
            indexing: IndexingConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            file_watch: FileWatchConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
            max_files: default_max_files(),
            extensions: default_extensions(),
            excluded_dirs: default_excluded_dirs(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_enabled: true,
            model: default_embedding_model(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            related_types: default_related_types(),
        }
    }
}

impl Default for FileWatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    /// Defaults, then the TOML file, then `CS_` variables (`__` separates levels)
    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("CS_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
    }

    /// Find the workspace config by looking for a .codesense directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .codesense is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Database path resolved against the workspace root when relative
    pub fn resolved_database_path(&self) -> PathBuf {
        match &self.workspace_root {
            Some(root) if self.database_path.is_relative() => root.join(&self.database_path),
            _ => self.database_path.clone(),
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Write a default settings file under `dir/.codesense/settings.toml`
    pub fn init_config_file(
        dir: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

/// Directory where downloaded embedding models are cached
pub fn models_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("models")
}
