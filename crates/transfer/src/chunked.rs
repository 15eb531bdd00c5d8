use std::io::ErrorKind;
use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::types::Chunk;
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

// ---------------------------------------------------------------------------
// Chunk math
// ---------------------------------------------------------------------------

fn effective_chunk_size(chunk_size: usize) -> usize {
    if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    }
}

/// Number of chunks a file of `file_size` bytes is split into.
///
/// An empty file has zero chunks. A `chunk_size` of 0 means
/// [`DEFAULT_CHUNK_SIZE`].
pub fn total_chunks(file_size: u64, chunk_size: usize) -> usize {
    file_size.div_ceil(effective_chunk_size(chunk_size) as u64) as usize
}

/// Attachment name for the chunk with one-based `number`.
///
/// `movie.mkv` chunk 1 becomes `movie.mkv.part0001`.
pub fn chunk_label(file_name: &str, number: usize) -> String {
    format!("{file_name}.part{number:04}")
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a file forward-only in fixed-size chunks.
///
/// The file handle is held for the reader's lifetime and released when the
/// reader is dropped, whether the sequence was exhausted or abandoned.
#[derive(Debug)]
pub struct ChunkReader {
    file: File,
    chunk_size: usize,
    index: usize,
    offset: u64,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (10 MiB) is used.
    /// Returns [`TransferError::NotFound`] unless `path` is a readable
    /// regular file.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let not_found = || TransferError::NotFound(path.display().to_string());

        let metadata = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => not_found(),
            _ => TransferError::Io(e),
        })?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        let file = File::open(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => not_found(),
            _ => TransferError::Io(e),
        })?;

        Ok(Self {
            file,
            chunk_size: effective_chunk_size(chunk_size),
            index: 0,
            offset: 0,
            file_size: metadata.len(),
        })
    }

    /// Reads the next chunk. Returns `None` once the size seen at open has
    /// been read.
    ///
    /// Each chunk is filled completely unless it is the last one, so chunk
    /// boundaries are always multiples of the chunk size. A file that ends
    /// early fails with an `UnexpectedEof` I/O error.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let remaining = self.file_size.saturating_sub(self.offset);
        if remaining == 0 {
            return Ok(None);
        }

        let want = remaining.min(self.chunk_size as u64);
        let mut buf = Vec::with_capacity(want as usize);
        (&mut self.file).take(want).read_to_end(&mut buf).await?;
        if (buf.len() as u64) < want {
            // File shrank after open.
            tracing::warn!(
                offset = self.offset,
                expected = self.file_size,
                "file ended before its recorded size"
            );
            return Err(TransferError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "file ended at byte {} of {}",
                    self.offset + buf.len() as u64,
                    self.file_size
                ),
            )));
        }

        let chunk = Chunk {
            index: self.index,
            offset: self.offset,
            data: buf,
        };
        self.offset += chunk.len() as u64;
        self.index += 1;
        Ok(Some(chunk))
    }

    /// Chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Total file size in bytes, as seen when the reader was opened.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of chunks this reader will yield in total.
    pub fn total_chunks(&self) -> usize {
        total_chunks(self.file_size, self.chunk_size)
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.offset)
    }
}
