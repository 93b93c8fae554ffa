//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage:
//! - A temporary store root
//! - A project directory with its own `.cairn/config.toml`
//! - A fake home directory for the global config
//!
//! # Usage
//!
//! ```ignore
//! use cairn_config::testing::TestEnvironment;
//!
//! #[test]
//! fn test_something() {
//!     let env = TestEnvironment::new().unwrap();
//!     let file = env.create_file("data/blob.bin", b"bytes").unwrap();
//!     // env.store_root, env.project_root and env.home_dir are all isolated
//! }
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

use crate::{Config, ConfigError, ENV_STORE};

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Isolated test environment with unique paths
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Isolated content store root
    pub store_root: PathBuf,
    /// Project root for the test (use as working directory)
    pub project_root: PathBuf,
    /// Stand-in for `$HOME`
    pub home_dir: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        let project_root = root.join("project");
        let store_root = root.join("store");
        let home_dir = root.join("home");

        std::fs::create_dir_all(&project_root)?;
        std::fs::create_dir_all(&store_root)?;
        std::fs::create_dir_all(&home_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            store_root,
            project_root,
            home_dir,
            test_id,
        })
    }

    /// Path of the global config under the fake home
    pub fn global_config_path(&self) -> PathBuf {
        self.home_dir.join(".cairn").join("config.toml")
    }

    /// Path of the project config
    pub fn project_config_path(&self) -> PathBuf {
        self.project_root.join(".cairn").join("config.toml")
    }

    pub fn write_global_config(&self, contents: &str) -> anyhow::Result<PathBuf> {
        write_with_parents(self.global_config_path(), contents.as_bytes())
    }

    pub fn write_project_config(&self, contents: &str) -> anyhow::Result<PathBuf> {
        write_with_parents(self.project_config_path(), contents.as_bytes())
    }

    /// Load the layered config this environment describes (no process env).
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let global = self.global_config_path();
        let project = self.project_config_path();
        Config::load_from(Some(&global), Some(&project))
    }

    /// Create a test file with content
    pub fn create_file(&self, relative_path: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
        write_with_parents(self.project_root.join(relative_path), content)
    }

    /// Create a test directory
    pub fn create_dir(&self, relative_path: &str) -> anyhow::Result<PathBuf> {
        let path = self.project_root.join(relative_path);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Environment variables for spawning `cairn` against this environment.
    pub fn cli_env(&self) -> Vec<(String, String)> {
        vec![
            ("HOME".to_string(), self.home_dir.display().to_string()),
            (ENV_STORE.to_string(), self.store_root.display().to_string()),
        ]
    }
}

fn write_with_parents(path: PathBuf, content: &[u8]) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content)?;
    Ok(path)
}
