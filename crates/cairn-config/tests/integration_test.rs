//! Integration tests for cairn-config
//!
//! These tests verify the full config loading pipeline with real file system operations.

use std::path::PathBuf;

use cairn_config::testing::TestEnvironment;
use cairn_config::{Config, ConfigError, ENV_STORE, ENV_THREADS};
use cairn_manifest::Layout;

/// Test config loading from real global config file
#[test]
fn test_load_global_config_from_file() {
    let env = TestEnvironment::new().unwrap();
    env.write_global_config(
        r#"
[storage]
root = "/custom/store"

[chunking]
chunk_size = 4096
manifest_size_limit = 10000
hashes_per_part = 100

[ingest]
threads = 4
"#,
    )
    .unwrap();

    let config = env.load_config().unwrap();
    assert_eq!(config.storage.root, PathBuf::from("/custom/store"));
    assert_eq!(
        config.chunking.layout(),
        Layout {
            chunk_size: 4096,
            manifest_size_limit: 10_000,
            hashes_per_part: 100,
        }
    );
    assert_eq!(config.ingest.threads, Some(4));
}

/// Test config hierarchy: project config overrides global
#[test]
fn test_config_hierarchy_project_overrides_global() {
    let env = TestEnvironment::new().unwrap();
    env.write_global_config(
        r#"
[storage]
root = "/global/store"

[chunking]
chunk_size = 1000
hashes_per_part = 50
"#,
    )
    .unwrap();
    env.write_project_config(
        r#"
[chunking]
chunk_size = 2000
"#,
    )
    .unwrap();

    let config = env.load_config().unwrap();

    // Overridden by project
    assert_eq!(config.chunking.chunk_size, 2000);
    // Kept from global
    assert_eq!(config.chunking.hashes_per_part, 50);
    assert_eq!(config.storage.root, PathBuf::from("/global/store"));
    // Untouched default
    assert_eq!(config.chunking.manifest_size_limit, 60_000);
}

#[test]
fn test_partial_config_uses_defaults() {
    let env = TestEnvironment::new().unwrap();
    env.write_project_config("[ingest]\nthreads = 2\n").unwrap();

    let config = env.load_config().unwrap();
    assert_eq!(config.ingest.threads, Some(2));
    assert_eq!(config.chunking, Config::default().chunking);
    assert_eq!(config.storage, Config::default().storage);
}

#[test]
fn test_env_overrides_beat_files() {
    let env = TestEnvironment::new().unwrap();
    env.write_project_config("[storage]\nroot = \"/from/file\"\n[ingest]\nthreads = 2\n")
        .unwrap();

    let mut config = env.load_config().unwrap();
    config.apply_overrides(|key| match key {
        k if k == ENV_STORE => Some("/from/env".to_string()),
        k if k == ENV_THREADS => Some("8".to_string()),
        _ => None,
    });

    assert_eq!(config.storage.root, PathBuf::from("/from/env"));
    assert_eq!(config.ingest.threads, Some(8));
}

#[test]
fn test_invalid_toml_names_the_file() {
    let env = TestEnvironment::new().unwrap();
    let path = env.write_project_config("[chunking\nchunk_size = ").unwrap();

    match env.load_config() {
        Err(ConfigError::Toml { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Toml error, got {other:?}"),
    }
}

#[test]
fn test_wrong_type_is_rejected() {
    let env = TestEnvironment::new().unwrap();
    env.write_project_config("[chunking]\nchunk_size = \"big\"\n")
        .unwrap();

    assert!(matches!(env.load_config(), Err(ConfigError::Toml { .. })));
}

#[test]
fn test_zero_chunk_size_fails_validation() {
    let env = TestEnvironment::new().unwrap();
    env.write_project_config("[chunking]\nchunk_size = 0\n").unwrap();

    let config = env.load_config().unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_default_toml_parses_back() {
    let text = Config::default_toml().unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed, Config::default());
}

#[test]
fn test_resolved_root_expands_home() {
    let config = Config::default();
    let resolved = config.storage.resolved_root();
    assert!(resolved.ends_with(".cairn/store"));
    assert!(!resolved.starts_with("~"));
}
