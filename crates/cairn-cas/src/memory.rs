//! In-memory content store.

use dashmap::DashMap;
use tracing::debug;

use crate::{CasError, ContentHash, ContentStore, Result};

/// In-memory content store backed by a [`DashMap`].
///
/// Useful for tests and for one-shot operations that never touch disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: DashMap<ContentHash, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs held.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Total bytes held across all blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs.iter().map(|b| b.value().len() as u64).sum()
    }
}

impl ContentStore for MemoryStore {
    fn put(&self, content: &[u8]) -> Result<ContentHash> {
        let hash = ContentHash::compute(content);
        self.blobs.entry(hash).or_insert_with(|| {
            debug!(%hash, size = content.len(), "storing blob in memory");
            content.to_vec()
        });
        Ok(hash)
    }

    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(hash).map(|b| b.value().clone()))
    }

    fn contains(&self, hash: &ContentHash) -> Result<bool> {
        Ok(self.blobs.contains_key(hash))
    }

    fn delete(&self, hash: &ContentHash) -> Result<()> {
        self.blobs
            .remove(hash)
            .map(|_| ())
            .ok_or_else(|| CasError::NotFound {
                hash: hash.to_string(),
            })
    }
}
