//! # cairn-config
//!
//! Configuration management for Cairn.
//!
//! Loads configuration from:
//! 1. `~/.cairn/config.toml` (global)
//! 2. `.cairn/config.toml` (project-local, overrides global key by key)
//! 3. Environment variables (highest priority)

pub mod logging;
pub mod path;
pub mod testing;

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use cairn_manifest::{Layout, CHUNK_SIZE, HASHES_PER_PART, MANIFEST_SIZE_LIMIT};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Environment variable overriding `storage.root`.
pub const ENV_STORE: &str = "CAIRN_STORE";
/// Environment variable overriding `ingest.threads`.
pub const ENV_THREADS: &str = "CAIRN_THREADS";

/// Global config instance
static CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new(Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "falling back to default config");
        Config::default()
    }))
});

/// Get global config (read-only)
pub fn config() -> RwLockReadGuard<'static, Config> {
    CONFIG.read().unwrap_or_else(PoisonError::into_inner)
}

/// Reload config from disk
pub fn reload() -> Result<(), ConfigError> {
    let new_config = Config::load()?;
    *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = new_config;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub chunking: ChunkingConfig,
    pub ingest: IngestConfig,
}

impl Config {
    /// Load config from standard locations
    pub fn load() -> Result<Self, ConfigError> {
        let global = Self::global_config_path();
        let project = Self::project_config_path();
        let mut config = Self::load_from(global.as_deref(), Some(&project))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Layer the given files (missing files are skipped) without env overrides.
    ///
    /// Tables are merged key by key, so a project file that only sets
    /// `chunking.chunk_size` keeps every other global setting.
    pub fn load_from(global: Option<&Path>, project: Option<&Path>) -> Result<Self, ConfigError> {
        let mut merged = toml::Table::new();
        for path in [global, project].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)?;
            let table: toml::Table = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
            merge_tables(&mut merged, table);
        }

        let origin = project.or(global).unwrap_or_else(|| Path::new("<default>"));
        toml::Value::Table(merged)
            .try_into()
            .map_err(|source| ConfigError::Toml {
                path: origin.to_path_buf(),
                source,
            })
    }

    /// Global config path: ~/.cairn/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".cairn/config.toml"))
    }

    /// Project config path: .cairn/config.toml under the working directory
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".cairn/config.toml")
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_STORE).filter(|s| !s.is_empty()) {
            self.storage.root = PathBuf::from(root);
        }
        if let Some(threads) = lookup(ENV_THREADS) {
            match threads.parse() {
                Ok(n) => self.ingest.threads = Some(n),
                Err(_) => warn!(value = %threads, "ignoring unparsable {}", ENV_THREADS),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking
            .layout()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.ingest.threads == Some(0) {
            return Err(ConfigError::Invalid("ingest.threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Generate default config TOML string
    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&Config::default())?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming)
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Content store root directory (`~` is expanded)
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("~/.cairn/store"),
        }
    }
}

impl StorageConfig {
    /// Store root with a leading `~` expanded.
    pub fn resolved_root(&self) -> PathBuf {
        path::expand_home(&self.root)
    }
}

/// Chunking and pagination parameters handed to the manifest builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in bytes
    pub chunk_size: usize,
    /// Serialized manifest size above which hash lists are paginated
    pub manifest_size_limit: usize,
    /// Hashes per part when paginating
    pub hashes_per_part: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            manifest_size_limit: MANIFEST_SIZE_LIMIT,
            hashes_per_part: HASHES_PER_PART,
        }
    }
}

impl ChunkingConfig {
    pub fn layout(&self) -> Layout {
        Layout {
            chunk_size: self.chunk_size,
            manifest_size_limit: self.manifest_size_limit,
            hashes_per_part: self.hashes_per_part,
        }
    }
}

/// Ingest configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Number of parallel threads (None = auto)
    pub threads: Option<usize>,
}
