//! Chunking and pagination parameters.

use crate::error::{ManifestError, Result};

/// Maximum size of a single chunk, in bytes.
pub const CHUNK_SIZE: usize = 60_000;

/// Serialized manifest size above which the hash list is paginated.
pub const MANIFEST_SIZE_LIMIT: usize = 60_000;

/// Maximum number of chunk hashes carried by one part.
pub const HASHES_PER_PART: usize = 800;

/// Parameters a [`ManifestBuilder`](crate::ManifestBuilder) uses to shape its output.
///
/// Only the builder consumes a layout. Restoring never needs one: hash lists are
/// re-split purely by the fixed hash width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub chunk_size: usize,
    pub manifest_size_limit: usize,
    pub hashes_per_part: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            manifest_size_limit: MANIFEST_SIZE_LIMIT,
            hashes_per_part: HASHES_PER_PART,
        }
    }
}

impl Layout {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ManifestError::InvalidLayout(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.hashes_per_part == 0 {
            return Err(ManifestError::InvalidLayout(
                "hashes_per_part must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
