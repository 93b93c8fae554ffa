//! Directory tree encoding.
//!
//! A directory is described by a JSON listing of its children. Each child is a
//! [`TreeNode`]: a leaf's manifest describes the file's bytes, a directory's
//! manifest describes the JSON listing of its own children. The listing is
//! also carried inline in `children`, which is what marks a node as a
//! directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use cairn_cas::ContentStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{ManifestError, Result};
use crate::{Manifest, ManifestBuilder, ManifestWalker};

/// One entry in an encoded tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub manifest: Manifest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        self.children.is_some()
    }

    /// Number of leaf files under (and including) this node.
    pub fn file_count(&self) -> usize {
        match &self.children {
            Some(children) => children.iter().map(TreeNode::file_count).sum(),
            None => 1,
        }
    }
}

/// Encodes files and directories into [`TreeNode`]s.
pub struct TreeEncoder<'a, S: ContentStore> {
    builder: ManifestBuilder<'a, S>,
}

impl<'a, S: ContentStore> TreeEncoder<'a, S> {
    pub fn new(builder: ManifestBuilder<'a, S>) -> Self {
        Self { builder }
    }

    /// Encode the file or directory at `path`.
    ///
    /// Directory entries are visited in file-name order so the same tree always
    /// encodes to the same listing. Symlinks are followed.
    pub fn encode_path(&self, path: &Path) -> Result<TreeNode> {
        let meta = fs::metadata(path)?;
        let name = entry_name(path)?;

        if meta.is_file() {
            let stored = if meta.len() == 0 {
                self.builder.build(&[])?
            } else {
                let file = File::open(path)?;
                // Safety: the mapping is read-only and dropped before returning.
                let mmap = unsafe { memmap2::Mmap::map(&file) }?;
                self.builder.build(&mmap)?
            };
            debug!(path = %path.display(), handle = %stored.handle, "encoded file");
            Ok(TreeNode {
                name,
                manifest: stored.manifest,
                children: None,
            })
        } else if meta.is_dir() {
            let mut children = Vec::new();
            for entry in WalkDir::new(path)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
            {
                let entry = entry.map_err(std::io::Error::other)?;
                children.push(self.encode_path(entry.path())?);
            }

            let listing = serde_json::to_vec(&children)?;
            let stored = self.builder.build(&listing)?;
            debug!(path = %path.display(), entries = children.len(), "encoded directory");
            Ok(TreeNode {
                name,
                manifest: stored.manifest,
                children: Some(children),
            })
        } else {
            Err(ManifestError::UnsupportedInput {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Restores [`TreeNode`]s onto the filesystem.
pub struct TreeDecoder<'a, S: ContentStore> {
    walker: ManifestWalker<'a, S>,
}

impl<'a, S: ContentStore> TreeDecoder<'a, S> {
    pub fn new(walker: ManifestWalker<'a, S>) -> Self {
        Self { walker }
    }

    /// Recreate `node` under `out_dir`, returning the files written.
    ///
    /// Each file is written to a temp file and renamed into place only after
    /// its restore succeeded, so a failed restore never leaves a truncated file.
    pub fn decode_into(&self, node: &TreeNode, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        self.decode_node(node, out_dir, &mut written)?;
        Ok(written)
    }

    /// Recover a directory's listing from its manifest alone.
    pub fn listing(&self, manifest: &Manifest) -> Result<Vec<TreeNode>> {
        let bytes = self.walker.restore(manifest)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn decode_node(&self, node: &TreeNode, out_dir: &Path, written: &mut Vec<PathBuf>) -> Result<()> {
        check_entry_name(&node.name)?;
        let out_path = out_dir.join(&node.name);

        match &node.children {
            Some(children) => {
                fs::create_dir_all(&out_path)?;
                for child in children {
                    self.decode_node(child, &out_path, written)?;
                }
            }
            None => {
                let data = self.walker.restore(&node.manifest)?;
                fs::create_dir_all(out_dir)?;
                write_atomic(&out_path, &data)?;
                info!(path = %out_path.display(), size = data.len(), "restored file");
                written.push(out_path);
            }
        }
        Ok(())
    }
}

fn entry_name(path: &Path) -> Result<String> {
    let name = match path.file_name() {
        Some(name) => name.to_os_string(),
        // `.` or `..` and friends: name the entry after what it resolves to.
        None => fs::canonicalize(path)?
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| ManifestError::UnsupportedInput {
                path: path.to_path_buf(),
            })?,
    };
    // Tree names are JSON strings and must survive a restore unchanged.
    name.into_string()
        .map_err(|_| ManifestError::UnsupportedInput {
            path: path.to_path_buf(),
        })
}

/// Tree names come from untrusted JSON; they must not escape `out_dir`.
fn check_entry_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ManifestError::InvalidEntryName(name.to_string())),
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
