//! Manifest construction.

use cairn_cas::{ContentHash, ContentStore};
use tracing::{debug, instrument};

use crate::chunker::Chunker;
use crate::codec::{self, ManifestRecord};
use crate::error::Result;
use crate::layout::Layout;
use crate::pool::{create_pool, ordered_map};
use crate::progress::{ProgressCounter, ProgressObserver, Step};
use crate::{HashList, Manifest, Part, StoredManifest};

/// Turns byte buffers into stored manifests.
///
/// ```ignore
/// let store = MemoryStore::new();
/// let stored = ManifestBuilder::new(&store).threads(Some(4)).build(&bytes)?;
/// println!("file {} at {}", stored.manifest.hash, stored.handle);
/// ```
pub struct ManifestBuilder<'a, S: ContentStore> {
    store: &'a S,
    layout: Layout,
    threads: Option<usize>,
    observer: Option<&'a dyn ProgressObserver>,
}

impl<'a, S: ContentStore> ManifestBuilder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            layout: Layout::default(),
            threads: None,
            observer: None,
        }
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Worker threads used for chunk uploads (None = default).
    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn progress(mut self, observer: Option<&'a dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Chunk, store and describe `data`.
    ///
    /// Chunks, parts and the root record are all written to the store before
    /// this returns. On error nothing is returned; blobs already written stay
    /// in the store and are reused by a retry.
    #[instrument(skip(self, data), fields(size = data.len()), level = "debug")]
    pub fn build(&self, data: &[u8]) -> Result<StoredManifest> {
        self.layout.validate()?;
        let chunks = Chunker::new(self.layout.chunk_size)?.split(data);
        debug!(chunks = chunks.len(), "chunked input");

        let pool = create_pool(self.threads)?;
        let progress = ProgressCounter::new(self.observer, Step::Upload, chunks.len());
        let chunk_hashes = ordered_map(&pool, &chunks, &progress, |chunk| {
            Ok(self.store.put(chunk.data)?)
        })?;

        let hash_list = HashList::new(chunk_hashes);
        let file_hash = self.store.put(hash_list.to_text().as_bytes())?;

        let candidate_len = codec::to_text(&ManifestRecord::hashes_only(hash_list.clone()))?.len();
        let (manifest, parts) =
            if hash_list.is_empty() || candidate_len <= self.layout.manifest_size_limit {
                (Manifest::direct(file_hash, hash_list), Vec::new())
            } else {
                debug!(
                    candidate_len,
                    limit = self.layout.manifest_size_limit,
                    "paginating hash list"
                );
                let parts = self.seal_parts(&hash_list)?;
                // Non-empty list yields at least one part.
                let first = parts[0].hash;
                (Manifest::paginated(file_hash, first), parts)
            };

        let handle = self.store.put(codec::to_text(&manifest)?.as_bytes())?;
        debug!(%handle, file = %manifest.hash, parts = parts.len(), "manifest stored");

        Ok(StoredManifest {
            handle,
            manifest,
            parts,
        })
    }

    /// Store the part chain for `hash_list`, returned first to last.
    ///
    /// A part's stored record carries its `next` link, so its hash depends on
    /// its successor's hash: parts are sealed from the tail backwards.
    fn seal_parts(&self, hash_list: &HashList) -> Result<Vec<Part>> {
        let segments: Vec<HashList> = hash_list.segments(self.layout.hashes_per_part).collect();
        let mut parts = Vec::with_capacity(segments.len());
        let mut next: Option<ContentHash> = None;

        for segment in segments.into_iter().rev() {
            let text = codec::to_text(&ManifestRecord::part(segment.clone(), next))?;
            let hash = self.store.put(text.as_bytes())?;
            debug!(%hash, hashes = segment.len(), "sealed part");
            parts.push(Part {
                concatenated_hashes: segment,
                hash,
                next,
            });
            next = Some(hash);
        }

        parts.reverse();
        Ok(parts)
    }
}
