//! ChunkedVec - an in-memory chunked store.

use std::ops::Range;

use bytes::{Bytes, BytesMut};

use super::{Axis, ChunkedStore, StoreIter};
use crate::error::ProviderError;
use crate::flags::Kind;
use crate::util::check_range;

/// An append-friendly store of fixed-width rows.
///
/// Rows are packed into sealed chunks of `chunk_rows` rows each; rows that
/// do not fill a chunk yet wait in a tail buffer. Reads inside one sealed
/// chunk are zero-copy.
///
/// # Example
///
/// ```
/// use byteprovider::{Axis, ChunkedStore, ChunkedVec};
///
/// let mut store = ChunkedVec::new(4, 2)?;
/// store.append_rows(b"aaaabbbbcccc")?;
/// assert_eq!(store.rows(), 3);
///
/// let middle = store.select(&[Axis::Full, Axis::Range(1..3)])?;
/// assert_eq!(&middle[..], b"aabbcc");
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ChunkedVec {
    row_bytes: usize,
    chunk_rows: usize,
    sealed: Vec<Bytes>,
    tail: BytesMut,
}

impl ChunkedVec {
    /// Creates an empty store.
    ///
    /// Returns [`ProviderError::InvalidConfig`] if either size is zero.
    pub fn new(row_bytes: usize, chunk_rows: usize) -> Result<Self, ProviderError> {
        if row_bytes == 0 || chunk_rows == 0 {
            return Err(ProviderError::InvalidConfig {
                message: "row width and chunk length must be non-zero",
            });
        }
        Ok(Self {
            row_bytes,
            chunk_rows,
            sealed: Vec::new(),
            tail: BytesMut::new(),
        })
    }

    /// Creates a store holding `data`, which must be whole rows.
    pub fn from_rows(row_bytes: usize, chunk_rows: usize, data: &[u8]) -> Result<Self, ProviderError> {
        let mut store = Self::new(row_bytes, chunk_rows)?;
        store.append_rows(data)?;
        Ok(store)
    }

    /// Number of sealed chunks.
    pub fn sealed_chunks(&self) -> usize {
        self.sealed.len()
    }

    fn chunk_bytes(&self) -> usize {
        self.row_bytes * self.chunk_rows
    }

    fn segment(&self, index: usize) -> &[u8] {
        match self.sealed.get(index) {
            Some(chunk) => chunk,
            None => &self.tail,
        }
    }
}

impl ChunkedStore for ChunkedVec {
    fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    fn rows(&self) -> u64 {
        let bytes = self.sealed.len() * self.chunk_bytes() + self.tail.len();
        (bytes / self.row_bytes) as u64
    }

    fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }

    fn read(&self, range: Range<u64>) -> Result<Bytes, ProviderError> {
        let span = check_range(&range, self.byte_len())?;
        if span.is_empty() {
            return Ok(Bytes::new());
        }

        let chunk_bytes = self.chunk_bytes();
        let first = span.start / chunk_bytes;
        let last = (span.end - 1) / chunk_bytes;

        if first == last {
            let local = span.start - first * chunk_bytes..span.end - first * chunk_bytes;
            return Ok(match self.sealed.get(first) {
                Some(chunk) => chunk.slice(local),
                None => Bytes::copy_from_slice(&self.tail[local]),
            });
        }

        let mut out = BytesMut::with_capacity(span.len());
        for index in first..=last {
            let base = index * chunk_bytes;
            let segment = self.segment(index);
            let from = span.start.max(base) - base;
            let to = span.end.min(base + segment.len()) - base;
            out.extend_from_slice(&segment[from..to]);
        }
        Ok(out.freeze())
    }

    fn select(&self, key: &[Axis]) -> Result<Bytes, ProviderError> {
        if key.len() > 2 {
            return Err(ProviderError::UnsupportedOperation {
                operation: "selection with more than two axes",
                kind: Kind::Memory,
            });
        }
        let rows = key.first().unwrap_or(&Axis::Full).bounds(self.rows())?;
        let columns = key.get(1).unwrap_or(&Axis::Full).bounds(self.row_bytes as u64)?;
        let row_bytes = self.row_bytes as u64;

        if columns == (0..row_bytes) {
            return self.read(rows.start * row_bytes..rows.end * row_bytes);
        }

        let width = (columns.end - columns.start) as usize;
        let mut out = BytesMut::with_capacity(width * (rows.end - rows.start) as usize);
        for row in rows {
            let base = row * row_bytes;
            out.extend_from_slice(&self.read(base + columns.start..base + columns.end)?);
        }
        Ok(out.freeze())
    }

    fn iter_rows(&self, rows_per_chunk: usize, start: u64, stop: u64) -> StoreIter<'_> {
        let row_bytes = self.row_bytes as u64;
        let step = rows_per_chunk.max(1);
        Box::new((start..stop).step_by(step).map(move |row| {
            let end = stop.min(row + step as u64);
            self.read(row * row_bytes..end * row_bytes)
        }))
    }

    fn append_rows(&mut self, data: &[u8]) -> Result<(), ProviderError> {
        if data.len() % self.row_bytes != 0 {
            return Err(ProviderError::Misaligned {
                len: data.len() as u64,
                unit: self.row_bytes,
            });
        }
        self.tail.extend_from_slice(data);
        let chunk_bytes = self.chunk_bytes();
        while self.tail.len() >= chunk_bytes {
            self.sealed.push(self.tail.split_to(chunk_bytes).freeze());
        }
        Ok(())
    }
}
