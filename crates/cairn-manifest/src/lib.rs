//! # cairn-manifest
//!
//! Chunked, content-addressed file representation.
//!
//! Bytes are split into fixed-size chunks, each chunk is stored in a
//! [`ContentStore`] under its content hash, and a [`Manifest`] records the
//! ordered hash list needed to reassemble them.
//!
//! ## Manifest shapes
//!
//! ```text
//! Direct:     { hash, concatenatedHashes }
//! Paginated:  { hash, next } ──▶ Part { concatenatedHashes, next } ──▶ Part { concatenatedHashes }
//! ```
//!
//! `hash` is the content hash of the full hash list and identifies the file
//! itself, however the list is stored. When the serialized hash list would
//! exceed [`MANIFEST_SIZE_LIMIT`], it is split into parts of at most
//! [`HASHES_PER_PART`] hashes, linked by the content hash of each part's
//! stored record.
//!
//! ## Entry points
//!
//! - [`store_file`] / [`ManifestBuilder`]: bytes → [`StoredManifest`]
//! - [`restore_file`] / [`ManifestWalker`]: [`Manifest`] → bytes
//! - [`tree`]: directories as nested JSON listings

mod builder;
mod chunker;
pub mod codec;
mod error;
mod hash_list;
mod layout;
mod pool;
mod progress;
pub mod tree;
mod walker;

pub use builder::ManifestBuilder;
pub use chunker::{Chunk, Chunker};
pub use codec::ManifestRecord;
pub use error::{ManifestError, Result};
pub use hash_list::HashList;
pub use layout::{Layout, CHUNK_SIZE, HASHES_PER_PART, MANIFEST_SIZE_LIMIT};
pub use pool::{default_thread_count, MAX_WORKER_THREADS};
pub use progress::{ProgressObserver, Step};
pub use tree::{TreeDecoder, TreeEncoder, TreeNode};
pub use walker::ManifestWalker;

pub use cairn_cas::{ContentHash, ContentStore, HASH_LENGTH};

use serde::{Deserialize, Serialize};

/// Root description of a stored file.
///
/// The builder emits exactly one of `concatenated_hashes` (direct) or `next`
/// (paginated). The walker accepts both on the same node, inline hashes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Content hash of the full hash list: the file's identity.
    pub hash: ContentHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concatenated_hashes: Option<HashList>,
    /// First part of the paginated hash list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<ContentHash>,
}

impl Manifest {
    pub fn direct(hash: ContentHash, hashes: HashList) -> Self {
        Self {
            hash,
            concatenated_hashes: Some(hashes),
            next: None,
        }
    }

    pub fn paginated(hash: ContentHash, first_part: ContentHash) -> Self {
        Self {
            hash,
            concatenated_hashes: None,
            next: Some(first_part),
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.next.is_some()
    }

    /// Handle this manifest's root record has in a BLAKE3-addressed store.
    ///
    /// Matches [`StoredManifest::handle`] for stores built on
    /// [`ContentHash::compute`], without touching the store.
    pub fn handle(&self) -> Result<ContentHash> {
        Ok(ContentHash::compute(codec::to_text(self)?.as_bytes()))
    }

    pub(crate) fn to_record(&self) -> ManifestRecord {
        ManifestRecord {
            hash: Some(self.hash),
            concatenated_hashes: self.concatenated_hashes.clone(),
            next: self.next,
        }
    }
}

/// One node of a paginated hash-list chain.
///
/// `hash` is the content hash of the part's stored record, which holds
/// `concatenated_hashes` and `next` but not `hash` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub concatenated_hashes: HashList,
    pub hash: ContentHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<ContentHash>,
}

/// Result of a build: the manifest plus where everything landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredManifest {
    /// Content hash of the stored root record. Distinct from `manifest.hash`,
    /// which identifies file content rather than the record.
    pub handle: ContentHash,
    pub manifest: Manifest,
    /// Part chain, first to last. Empty for direct manifests.
    pub parts: Vec<Part>,
}

/// Chunk and store `data` with the default layout.
pub fn store_file<S: ContentStore>(
    store: &S,
    data: &[u8],
    observer: Option<&dyn ProgressObserver>,
) -> Result<StoredManifest> {
    ManifestBuilder::new(store).progress(observer).build(data)
}

/// Reassemble the bytes described by `manifest`.
pub fn restore_file<S: ContentStore>(
    store: &S,
    manifest: &Manifest,
    observer: Option<&dyn ProgressObserver>,
) -> Result<Vec<u8>> {
    ManifestWalker::new(store).progress(observer).restore(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_and_paginated_shapes() {
        let file = ContentHash::compute(b"file");
        let part = ContentHash::compute(b"part");

        let direct = Manifest::direct(file, HashList::default());
        assert!(!direct.is_paginated());
        assert!(direct.concatenated_hashes.is_some());

        let paginated = Manifest::paginated(file, part);
        assert!(paginated.is_paginated());
        assert!(paginated.concatenated_hashes.is_none());
    }

    #[test]
    fn test_manifest_json_field_names() {
        let m = Manifest::paginated(ContentHash::compute(b"f"), ContentHash::compute(b"p"));
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"hash\""));
        assert!(json.contains("\"next\""));
        assert!(!json.contains("concatenatedHashes"));

        let parsed: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }

    #[test]
    fn test_handle_matches_stored_handle() {
        let store = cairn_cas::MemoryStore::new();
        let stored = store_file(&store, b"some bytes", None).unwrap();
        assert_eq!(stored.manifest.handle().unwrap(), stored.handle);
    }

    #[test]
    fn test_to_record_carries_all_fields() {
        let m = Manifest::direct(
            ContentHash::compute(b"f"),
            HashList::new(vec![ContentHash::compute(b"c")]),
        );
        let record = m.to_record();
        assert_eq!(record.hash, Some(m.hash));
        assert_eq!(record.concatenated_hashes, m.concatenated_hashes);
        assert_eq!(record.next, None);
    }
}
