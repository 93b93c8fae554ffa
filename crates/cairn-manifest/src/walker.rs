//! Manifest traversal and file reconstruction.

use std::collections::HashSet;

use cairn_cas::{ContentHash, ContentStore};
use tracing::{debug, instrument};

use crate::codec::{self, ManifestRecord};
use crate::error::{ManifestError, Result};
use crate::pool::{create_pool, ordered_map};
use crate::progress::{ProgressCounter, ProgressObserver, Step};
use crate::{HashList, Manifest};

/// Reassembles files from manifests.
///
/// A node contributes its inline `concatenatedHashes` first, then the chain
/// reachable through `next`. Both may be present on one node.
pub struct ManifestWalker<'a, S: ContentStore> {
    store: &'a S,
    threads: Option<usize>,
    observer: Option<&'a dyn ProgressObserver>,
}

impl<'a, S: ContentStore> ManifestWalker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            threads: None,
            observer: None,
        }
    }

    /// Worker threads used for chunk fetches (None = default).
    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn progress(mut self, observer: Option<&'a dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Load a root manifest by its handle.
    pub fn load(&self, handle: &ContentHash) -> Result<Manifest> {
        codec::from_bytes(&self.fetch_root(handle)?)
    }

    /// Restore the file described by `manifest`.
    pub fn restore(&self, manifest: &Manifest) -> Result<Vec<u8>> {
        self.restore_record(manifest.to_record())
    }

    /// Restore the file whose root record is stored under `handle`.
    pub fn restore_handle(&self, handle: &ContentHash) -> Result<Vec<u8>> {
        self.restore_record(codec::from_bytes(&self.fetch_root(handle)?)?)
    }

    fn fetch_root(&self, handle: &ContentHash) -> Result<Vec<u8>> {
        self.store
            .get(handle)?
            .ok_or(ManifestError::MissingManifest { hash: *handle })
    }

    /// Expand a manifest and its part chain into the full ordered hash list.
    pub fn collect_hashes(&self, manifest: &Manifest) -> Result<HashList> {
        self.expand(manifest.to_record())
    }

    fn expand(&self, root: ManifestRecord) -> Result<HashList> {
        let mut hashes = Vec::new();
        let mut visited = HashSet::new();
        let mut node = root;

        loop {
            if let Some(list) = &node.concatenated_hashes {
                hashes.extend_from_slice(list.hashes());
            }

            let Some(next) = node.next else {
                break;
            };
            if !visited.insert(next) {
                return Err(ManifestError::ChainCycle { hash: next });
            }

            let bytes = self
                .store
                .get(&next)?
                .ok_or(ManifestError::MissingPart { hash: next })?;
            node = codec::from_bytes(&bytes)?;
            debug!(part = %next, "followed manifest link");
        }

        Ok(HashList::new(hashes))
    }

    #[instrument(skip(self, root), level = "debug")]
    fn restore_record(&self, root: ManifestRecord) -> Result<Vec<u8>> {
        let hash_list = self.expand(root)?;
        let hashes = hash_list.hashes();
        debug!(chunks = hashes.len(), "fetching chunks");

        let pool = create_pool(self.threads)?;
        let progress = ProgressCounter::new(self.observer, Step::Recreate, hashes.len());
        let chunks = ordered_map(&pool, hashes, &progress, |hash| {
            self.store
                .get(hash)?
                .ok_or(ManifestError::MissingChunk { hash: *hash })
        })?;

        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut out = Vec::with_capacity(total);
        for chunk in &chunks {
            out.extend_from_slice(chunk);
        }
        Ok(out)
    }
}
