//! # cairn-cas
//!
//! Content-Addressable Storage (CAS) for Cairn.
//!
//! Every blob is addressed by the BLAKE3 hash of its content. Storing the same
//! bytes twice yields the same [`ContentHash`] and writes nothing new.
//!
//! ## Backends
//!
//! - [`CasStore`]: filesystem store with a 2-level fan-out directory layout
//! - [`MemoryStore`]: concurrent in-memory map, for tests and ephemeral use
//!
//! ## Directory Layout
//!
//! ```text
//! ~/.cairn/store/
//! └── blake3/
//!     └── ab/
//!         └── cd/
//!             └── abcd1234...ef   # full hex digest
//! ```

mod hash;
mod memory;

pub use hash::{ContentHash, HASH_LENGTH};
pub use memory::MemoryStore;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::instrument;
use walkdir::WalkDir;

/// Errors that can occur during CAS operations
#[derive(Error, Debug)]
pub enum CasError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Blob not found: {hash}")]
    NotFound { hash: String },

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Invalid content hash: {0}")]
    InvalidHash(String),
}

pub type Result<T> = std::result::Result<T, CasError>;

/// A content-addressed blob store.
///
/// `put` is deterministic and idempotent: identical content always yields the
/// identical hash, and re-storing existing content is a no-op. `get` returns
/// `Ok(None)` for unknown hashes; errors are reserved for I/O and integrity
/// failures.
///
/// Implementations must be `Send + Sync`; chunk uploads and fetches are issued
/// from a worker pool.
pub trait ContentStore: Send + Sync {
    /// Store content, returning its hash.
    fn put(&self, content: &[u8]) -> Result<ContentHash>;

    /// Retrieve content by hash. Returns `None` if not stored.
    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>>;

    /// Check whether a blob exists.
    fn contains(&self, hash: &ContentHash) -> Result<bool> {
        Ok(self.get(hash)?.is_some())
    }

    /// Remove a blob. Removing an unknown hash is `NotFound`.
    fn delete(&self, hash: &ContentHash) -> Result<()>;
}

impl<S: ContentStore + ?Sized> ContentStore for &S {
    fn put(&self, content: &[u8]) -> Result<ContentHash> {
        (**self).put(content)
    }

    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>> {
        (**self).get(hash)
    }

    fn contains(&self, hash: &ContentHash) -> Result<bool> {
        (**self).contains(hash)
    }

    fn delete(&self, hash: &ContentHash) -> Result<()> {
        (**self).delete(hash)
    }
}

impl<S: ContentStore + ?Sized> ContentStore for std::sync::Arc<S> {
    fn put(&self, content: &[u8]) -> Result<ContentHash> {
        (**self).put(content)
    }

    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>> {
        (**self).get(hash)
    }

    fn contains(&self, hash: &ContentHash) -> Result<bool> {
        (**self).contains(hash)
    }

    fn delete(&self, hash: &ContentHash) -> Result<()> {
        (**self).delete(hash)
    }
}

/// Filesystem Content-Addressable Storage store
///
/// Stores blobs indexed by their BLAKE3 hash with a 2-char prefix fan-out.
#[derive(Debug, Clone)]
pub struct CasStore {
    root: PathBuf,
}

impl CasStore {
    /// Create a new CAS store at the given root directory.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Get the path where a blob with the given hash would be stored.
    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        let hex = hash.to_hex();
        let l1 = &hex[..2];
        let l2 = &hex[2..4];
        self.root.join("blake3").join(l1).join(l2).join(&hex)
    }

    /// Store bytes in the CAS, returning the content hash.
    ///
    /// If the content already exists, this is a no-op (deduplication).
    /// Thread-safe: each writer uses a unique temp file name before the rename.
    #[instrument(skip(self, data), fields(size = data.len()), level = "debug")]
    pub fn store(&self, data: &[u8]) -> Result<ContentHash> {
        let hash = ContentHash::compute(data);
        let path = self.blob_path(&hash);

        if path.exists() {
            return Ok(hash);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_name = format!(
            "{}.{}.{:?}.tmp",
            hash.to_hex(),
            std::process::id(),
            std::thread::current().id()
        );
        let temp_path = path.with_file_name(&temp_name);
        write_temp_file(&temp_path, |file| {
            file.write_all(data)?;
            file.sync_all()
        })?;

        // If another thread won the rename, the content is identical.
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            if path.exists() {
                return Ok(hash);
            }
            return Err(CasError::Io(e));
        }

        Ok(hash)
    }

    /// Retrieve bytes from the CAS by hash, verifying integrity on read.
    #[instrument(skip(self), level = "debug")]
    pub fn load(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(hash);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CasError::Io(e)),
        };

        let actual = ContentHash::compute(&data);
        if actual != *hash {
            return Err(CasError::HashMismatch {
                expected: hash.to_string(),
                actual: actual.to_string(),
            });
        }

        Ok(Some(data))
    }

    /// Check if a blob exists in the CAS.
    pub fn exists(&self, hash: &ContentHash) -> bool {
        self.blob_path(hash).exists()
    }

    /// Delete a blob from the CAS.
    pub fn remove(&self, hash: &ContentHash) -> Result<()> {
        let path = self.blob_path(hash);
        if path.exists() {
            fs::remove_file(path)?;
            Ok(())
        } else {
            Err(CasError::NotFound {
                hash: hash.to_string(),
            })
        }
    }

    /// Get the root path of the CAS.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Iterate over all committed blob hashes (temp files are skipped).
    pub fn iter(&self) -> impl Iterator<Item = Result<ContentHash>> {
        WalkDir::new(self.root.join("blake3"))
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() => entry
                    .file_name()
                    .to_str()
                    .and_then(ContentHash::from_hex)
                    .map(Ok),
                Ok(_) => None,
                // A missing blake3/ dir just means an empty store.
                Err(e) if e.io_error().map(|io| io.kind()) == Some(io::ErrorKind::NotFound) => {
                    None
                }
                Err(e) => Some(Err(CasError::Io(io::Error::other(e)))),
            })
    }

    /// Get statistics about the CAS.
    pub fn stats(&self) -> Result<CasStats> {
        let mut stats = CasStats::default();

        for hash in self.iter() {
            let size = fs::metadata(self.blob_path(&hash?))?.len();
            stats.blob_count += 1;
            stats.total_bytes += size;

            if size < 1024 {
                stats.small_blobs += 1;
            } else if size < 1024 * 1024 {
                stats.medium_blobs += 1;
            } else if size < 100 * 1024 * 1024 {
                stats.large_blobs += 1;
            } else {
                stats.huge_blobs += 1;
            }
        }

        Ok(stats)
    }
}

/// Create `temp_path` and fill it; the file is removed again if `fill` fails.
fn write_temp_file<F>(temp_path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = File::create(temp_path)?;
    let filled = fill(&mut file);
    drop(file);
    if filled.is_err() {
        let _ = fs::remove_file(temp_path);
    }
    filled
}

impl ContentStore for CasStore {
    fn put(&self, content: &[u8]) -> Result<ContentHash> {
        self.store(content)
    }

    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>> {
        self.load(hash)
    }

    fn contains(&self, hash: &ContentHash) -> Result<bool> {
        Ok(self.exists(hash))
    }

    fn delete(&self, hash: &ContentHash) -> Result<()> {
        self.remove(hash)
    }
}

/// Statistics about the CAS store
#[derive(Debug, Clone, Default)]
pub struct CasStats {
    /// Number of unique blobs stored
    pub blob_count: u64,
    /// Total bytes stored (deduplicated)
    pub total_bytes: u64,
    /// Blobs < 1KB
    pub small_blobs: u64,
    /// Blobs 1KB - 1MB
    pub medium_blobs: u64,
    /// Blobs 1MB - 100MB
    pub large_blobs: u64,
    /// Blobs > 100MB
    pub huge_blobs: u64,
}

impl CasStats {
    /// Calculate average blob size
    pub fn avg_blob_size(&self) -> u64 {
        if self.blob_count == 0 {
            0
        } else {
            self.total_bytes / self.blob_count
        }
    }
}
