/// A chunk of file data read by [`ChunkReader`](crate::ChunkReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of this chunk in the file.
    pub index: usize,
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data. Shorter than the chunk size only for the last chunk.
    pub data: Vec<u8>,
}

impl Chunk {
    /// Size of this chunk in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// One-based sequence number used in chunk labels.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}
