//! Path helpers for config values and command-line arguments.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` to the home directory.
///
/// Paths without `~`, or when no home directory is known, are returned as-is.
pub fn expand_home(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Normalize a path where the target file may not exist yet.
///
/// Canonicalizes the parent directory and appends the filename.
/// Useful for output paths that will be created.
pub fn normalize_nonexistent(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let filename = path.file_name().context("Path has no filename")?;

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            let canonical_parent = parent.canonicalize().with_context(|| {
                format!("Failed to resolve parent directory: {}", parent.display())
            })?;
            Ok(canonical_parent.join(filename))
        }
        _ => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(filename))
        }
    }
}
