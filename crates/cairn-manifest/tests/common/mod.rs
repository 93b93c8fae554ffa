#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use cairn_cas::{ContentHash, ContentStore, MemoryStore, Result};
use cairn_manifest::Step;

/// Deterministic, mostly-unique payload of `len` bytes.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + i / 251) as u8).collect()
}

/// Buffer whose `count` chunks of `chunk_size` bytes are all distinct.
pub fn distinct_chunks(count: usize, chunk_size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(count * chunk_size);
    for i in 0..count as u64 {
        let mut chunk = vec![0u8; chunk_size];
        let tag = i.to_le_bytes();
        let n = tag.len().min(chunk_size);
        chunk[..n].copy_from_slice(&tag[..n]);
        data.extend_from_slice(&chunk);
    }
    data
}

/// Store wrapper whose latency shrinks as the first payload byte grows.
///
/// Chunks tagged with a low first byte answer last, so under a worker pool
/// completions arrive out of index order. Completion order is recorded.
pub struct SkewedStore {
    pub inner: MemoryStore,
    step_ms: u64,
    span: u64,
    pub completed: Mutex<Vec<ContentHash>>,
}

impl SkewedStore {
    pub fn new(step_ms: u64, span: u64) -> Self {
        Self {
            inner: MemoryStore::new(),
            step_ms,
            span,
            completed: Mutex::new(Vec::new()),
        }
    }

    fn delay_for(&self, first_byte: Option<u8>) {
        let tag = first_byte.map_or(self.span, |b| b as u64).min(self.span);
        let ms = (self.span - tag) * self.step_ms;
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }
}

impl ContentStore for SkewedStore {
    fn put(&self, content: &[u8]) -> Result<ContentHash> {
        self.delay_for(content.first().copied());
        let hash = self.inner.put(content)?;
        self.completed.lock().unwrap().push(hash);
        Ok(hash)
    }

    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>> {
        let data = self.inner.get(hash)?;
        self.delay_for(data.as_ref().and_then(|d| d.first().copied()));
        Ok(data)
    }

    fn delete(&self, hash: &ContentHash) -> Result<()> {
        self.inner.delete(hash)
    }
}

/// Progress sink recording every event.
#[derive(Default)]
pub struct Recorder {
    pub events: Mutex<Vec<(Step, usize, usize)>>,
}

impl Recorder {
    pub fn record(&self) -> impl Fn(Step, usize, usize) + Send + Sync + '_ {
        move |step, index, total| self.events.lock().unwrap().push((step, index, total))
    }

    pub fn take(&self) -> Vec<(Step, usize, usize)> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}
