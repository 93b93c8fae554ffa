//! Fixed-size chunker.

use crate::error::{ManifestError, Result};

/// A contiguous slice of the input, positioned solely by its offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Zero-based position in the chunk sequence.
    pub index: usize,
    /// Byte offset within the original buffer.
    pub offset: u64,
    pub data: &'a [u8],
}

/// Splits buffers into chunks of at most `chunk_size` bytes.
///
/// The last chunk may be smaller than `chunk_size`.
/// Empty data produces zero chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ManifestError::InvalidLayout(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { chunk_size })
    }

    /// Split data into chunks, borrowing from the input.
    pub fn split<'a>(&self, data: &'a [u8]) -> Vec<Chunk<'a>> {
        data.chunks(self.chunk_size)
            .enumerate()
            .map(|(index, slice)| Chunk {
                index,
                offset: (index * self.chunk_size) as u64,
                data: slice,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CHUNK_SIZE;

    #[test]
    fn test_chunk_empty_data() {
        let chunker = Chunker::new(1024).unwrap();
        assert!(chunker.split(b"").is_empty());
    }

    #[test]
    fn test_chunk_exactly_chunk_size() {
        let chunker = Chunker::new(CHUNK_SIZE).unwrap();
        let data = vec![0xABu8; CHUNK_SIZE];
        let chunks = chunker.split(&data);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].data, &data[..]);
        assert_eq!(chunks[0].offset, 0);
    }

    #[test]
    fn test_chunk_size_plus_one() {
        let chunker = Chunker::new(CHUNK_SIZE).unwrap();
        let data = vec![0xCDu8; CHUNK_SIZE + 1];
        let chunks = chunker.split(&data);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].data.len(), CHUNK_SIZE);
        assert_eq!(chunks[1].data.len(), 1);
        assert_eq!(chunks[1].offset, CHUNK_SIZE as u64);
    }

    #[test]
    fn test_chunk_150000_bytes() {
        let chunker = Chunker::new(CHUNK_SIZE).unwrap();
        let data = vec![0u8; 150_000];
        let sizes: Vec<_> = chunker.split(&data).iter().map(|c| c.data.len()).collect();
        assert_eq!(sizes, vec![60_000, 60_000, 30_000]);
    }

    #[test]
    fn test_indices_and_offsets() {
        let chunker = Chunker::new(100).unwrap();
        let data = vec![0xFFu8; 350];
        let chunks = chunker.split(&data);
        assert_eq!(chunks.len(), 4);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.offset, (i * 100) as u64);
        }
        assert_eq!(chunks[3].data.len(), 50);
    }

    #[test]
    fn test_split_is_deterministic() {
        let chunker = Chunker::new(4).unwrap();
        let data = b"deterministic chunk content";
        assert_eq!(chunker.split(data), chunker.split(data));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(Chunker::new(0).is_err());
    }
}
