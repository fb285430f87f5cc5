//! External chunked stores.
//!
//! - [`ChunkedStore`] - What a chunked, append-friendly store must expose
//! - [`Axis`] - One axis of a multi-dimensional selection key
//! - [`ChunkedVec`] - In-memory reference store
//!
//! Stores are organised along a leading dimension of fixed-width rows.
//! [`ContainerBytes`](crate::ContainerBytes) defers all of its semantics to
//! the store it wraps.

mod vec;

use std::ops::Range;

use bytes::Bytes;

use crate::error::ProviderError;

pub use vec::ChunkedVec;

/// Boxed iterator of store chunks.
pub type StoreIter<'a> = Box<dyn Iterator<Item = Result<Bytes, ProviderError>> + 'a>;

/// A chunked store organised as fixed-width rows along a leading dimension.
pub trait ChunkedStore {
    /// Width of one leading-dimension row in bytes.
    fn row_bytes(&self) -> usize;

    /// Number of rows currently stored.
    fn rows(&self) -> u64;

    /// The store's native chunk length in rows.
    fn chunk_rows(&self) -> usize;

    /// Total stored bytes.
    fn byte_len(&self) -> u64 {
        self.rows() * self.row_bytes() as u64
    }

    /// Reads a byte range.
    fn read(&self, range: Range<u64>) -> Result<Bytes, ProviderError>;

    /// Reads the bytes selected by a multi-dimensional key, row-major.
    fn select(&self, key: &[Axis]) -> Result<Bytes, ProviderError>;

    /// Iterates rows `start..stop` in chunks of `rows_per_chunk` rows.
    fn iter_rows(&self, rows_per_chunk: usize, start: u64, stop: u64) -> StoreIter<'_>;

    /// Appends whole rows at the end of the leading dimension.
    fn append_rows(&mut self, data: &[u8]) -> Result<(), ProviderError>;
}

/// One axis of a selection key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    /// A single position.
    Index(u64),
    /// A half-open range of positions.
    Range(Range<u64>),
    /// The whole axis.
    Full,
}

impl Axis {
    /// Resolves the axis against an extent of `len` positions.
    pub fn bounds(&self, len: u64) -> Result<Range<u64>, ProviderError> {
        let range = match self {
            Axis::Index(i) => *i..i.saturating_add(1),
            Axis::Range(r) => r.clone(),
            Axis::Full => 0..len,
        };
        if range.start > range.end || range.end > len {
            return Err(ProviderError::out_of_bounds(&range, len));
        }
        Ok(range)
    }
}

impl From<u64> for Axis {
    fn from(index: u64) -> Self {
        Axis::Index(index)
    }
}

impl From<Range<u64>> for Axis {
    fn from(range: Range<u64>) -> Self {
        Axis::Range(range)
    }
}
