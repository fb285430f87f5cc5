//! In-memory adapter over a resident buffer.

use std::ops::Range;

use bytes::Bytes;
use tracing::debug;

use crate::config::ChunkOptions;
use crate::error::ProviderError;
use crate::flags::{Flags, Kind};
use crate::provider::{ByteProvider, ChunkIter, ChunkSource, ProviderState, SliceChunks};
use crate::util::{check_range, write_bytes};
use crate::view::ByteView;

/// A provider over a buffer that already lives in memory.
///
/// The buffer is shared with the caller through `Bytes` reference counting,
/// so construction never copies. Length is fixed; `get` is an O(1) slice.
/// Without an explicit chunk size, iteration yields the whole extent as a
/// single chunk.
///
/// # Example
///
/// ```
/// use byteprovider::{ByteProvider, Flags, MemoryBytes};
///
/// let mut provider = MemoryBytes::writable(vec![0u8; 8])?;
/// assert!(provider.flags().has(Flags::WRITABLE));
///
/// provider.write_at(2, b"hi")?;
/// assert_eq!(provider.get(2..4)?.as_bytes()?, b"hi");
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
#[derive(Debug)]
pub struct MemoryBytes {
    state: ProviderState,
    data: Bytes,
}

impl MemoryBytes {
    /// Wraps an immutable buffer (READABLE | CONSTANT).
    pub fn new(data: impl Into<Bytes>) -> Result<Self, ProviderError> {
        Self::with_flags(data, Flags::READABLE | Flags::CONSTANT)
    }

    /// Wraps a buffer that may change externally but not through this
    /// provider (READABLE).
    pub fn read_only(data: impl Into<Bytes>) -> Result<Self, ProviderError> {
        Self::with_flags(data, Flags::READABLE)
    }

    /// Wraps a buffer that can be written through the provider
    /// (READABLE | WRITABLE).
    pub fn writable(data: impl Into<Bytes>) -> Result<Self, ProviderError> {
        Self::with_flags(data, Flags::READABLE | Flags::WRITABLE)
    }

    /// Wraps a buffer with explicit flags.
    ///
    /// Fails if the flags combine CONSTANT with WRITABLE.
    pub fn with_flags(data: impl Into<Bytes>, flags: Flags) -> Result<Self, ProviderError> {
        let data = data.into();
        let state = ProviderState::new(Kind::Memory, flags)?;
        debug!(len = data.len(), %flags, "memory provider created");
        Ok(Self { state, data })
    }

    /// Returns the current contents, sharing the buffer.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }
}

impl ByteProvider for MemoryBytes {
    fn kind(&self) -> Kind {
        self.state.kind()
    }

    fn flags(&self) -> Flags {
        self.state.flags()
    }

    fn total_length(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn get(&self, range: Range<u64>) -> Result<ByteView, ProviderError> {
        let span = check_range(&range, self.data.len() as u64)?;
        Ok(self.state.issue(self.data.slice(span), range.start))
    }

    fn iter_chunks(&mut self, options: ChunkOptions) -> Result<ChunkIter<'_>, ProviderError> {
        let len = self.data.len();
        let plan = options.resolve(len, Some(len as u64))?;
        let stop = plan.stop.unwrap_or(len as u64);
        let source = SliceChunks::new(self.data.clone(), plan.start, stop, plan.chunk_size);
        let guard = self.state.begin_iteration()?;
        Ok(ChunkIter::new(guard, ChunkSource::Slices(source)))
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<(), ProviderError> {
        self.state.check_writable("write_at")?;
        write_bytes(&mut self.data, offset, data)?;
        self.state.invalidate();
        Ok(())
    }
}
