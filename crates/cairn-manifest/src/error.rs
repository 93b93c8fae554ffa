//! Error types for manifest operations.

use std::io;
use std::path::PathBuf;

use cairn_cas::{CasError, ContentHash, HASH_LENGTH};
use thiserror::Error;

/// Errors that can occur while building, walking or encoding manifests.
///
/// Every variant is fatal to the operation that raised it: no partial
/// manifest or partial file is ever returned alongside an error.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// A chunk referenced by a hash list is not in the store.
    #[error("Missing chunk: {hash}")]
    MissingChunk { hash: ContentHash },

    /// A part referenced by `next` is not in the store.
    #[error("Missing linked manifest part: {hash}")]
    MissingPart { hash: ContentHash },

    /// A root manifest record addressed by handle is not in the store.
    #[error("Missing manifest: {hash}")]
    MissingManifest { hash: ContentHash },

    /// A filesystem entry that is neither a regular file nor a directory.
    #[error("Unsupported input: {}", path.display())]
    UnsupportedInput { path: PathBuf },

    /// A tree entry name that is not a single plain path component.
    #[error("Invalid tree entry name: {0:?}")]
    InvalidEntryName(String),

    #[error("Hash list length {len} is not a multiple of {}", HASH_LENGTH)]
    InvalidHashList { len: usize },

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// A `next` link points back at a part already visited.
    #[error("Manifest chain revisits part {hash}")]
    ChainCycle { hash: ContentHash },

    #[error("Store error: {0}")]
    Store(#[from] CasError),

    #[error("Manifest codec error: {0}")]
    Codec(#[from] serde_yaml::Error),

    #[error("Tree listing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
