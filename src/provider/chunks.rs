//! ChunkIter - the lazy chunk sequence returned by `iter_chunks`.

use std::iter::FusedIterator;

use bytes::{Bytes, BytesMut};
use tracing::trace;

use super::IterationGuard;
use crate::adapter::{ChainChunks, ReaderChunks, StoreChunks};
use crate::error::ProviderError;
use crate::view::{ByteView, Storage, ViewData};

/// An iterator over chunk views of a provider.
///
/// While a `ChunkIter` is alive its provider is in the `Iterating` phase
/// with WRITABLE suppressed. Dropping it (exhausted or not) returns the
/// provider to `Idle`, or to `Exhausted` for streams.
///
/// An error ends the sequence: the iterator yields `None` afterwards.
pub struct ChunkIter<'a> {
    source: ChunkSource<'a>,
    guard: IterationGuard<'a>,
    finished: bool,
}

impl<'a> ChunkIter<'a> {
    pub(crate) fn new(guard: IterationGuard<'a>, source: ChunkSource<'a>) -> Self {
        Self {
            source,
            guard,
            finished: false,
        }
    }
}

impl Iterator for ChunkIter<'_> {
    type Item = Result<ByteView, ProviderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.source.next_chunk() {
            Some(Ok((data, offset))) => {
                trace!(offset, len = data.len(), "chunk produced");
                Some(Ok(self.guard.issue(data, offset)))
            }
            Some(Err(e)) => {
                self.finished = true;
                Some(Err(e))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}

impl FusedIterator for ChunkIter<'_> {}

/// Where a [`ChunkIter`] gets its bytes from, one variant per access style.
pub(crate) enum ChunkSource<'a> {
    /// Zero-copy windows onto a resident buffer or mapping.
    Slices(SliceChunks),
    /// Fixed-size reads from a forward-only reader.
    Reader(ReaderChunks<'a>),
    /// Re-blocked chunks of an external chunked store.
    Store(StoreChunks<'a>),
    /// Re-blocked chunks of an ordered sequence of providers.
    Chain(ChainChunks<'a>),
}

impl ChunkSource<'_> {
    /// Returns the next chunk and its logical offset.
    fn next_chunk(&mut self) -> Option<Result<(ViewData, u64), ProviderError>> {
        let chunk = match self {
            ChunkSource::Slices(s) => return s.next_chunk().map(Ok),
            ChunkSource::Reader(r) => r.next_chunk(),
            ChunkSource::Store(s) => s.next_chunk(),
            ChunkSource::Chain(c) => c.next_chunk(),
        };
        chunk.map(|result| result.map(|(data, offset)| (data.into(), offset)))
    }
}

/// Walks `start..stop` of provider storage in `chunk_size` steps.
#[derive(Debug)]
pub(crate) struct SliceChunks {
    data: Storage,
    pos: usize,
    stop: usize,
    chunk_size: usize,
}

impl SliceChunks {
    /// `start..stop` must already be checked against `data.len()`.
    pub(crate) fn new(data: impl Into<Storage>, start: u64, stop: u64, chunk_size: usize) -> Self {
        Self {
            data: data.into(),
            pos: start as usize,
            stop: stop as usize,
            chunk_size,
        }
    }

    fn next_chunk(&mut self) -> Option<(ViewData, u64)> {
        if self.pos >= self.stop {
            return None;
        }
        let end = self.stop.min(self.pos.saturating_add(self.chunk_size));
        let chunk = self.data.window(self.pos..end);
        let offset = self.pos as u64;
        self.pos = end;
        Some((chunk, offset))
    }
}

/// Regroups buffers of arbitrary sizes into chunks of exactly `chunk_size`
/// bytes; only the final chunk may be shorter.
///
/// A buffer that is exactly one chunk and arrives with nothing pending is
/// passed through without copying.
#[derive(Debug)]
pub(crate) struct Reblock {
    chunk_size: usize,
    pending: BytesMut,
    /// Logical offset of the next emitted chunk.
    offset: u64,
}

impl Reblock {
    pub(crate) fn new(chunk_size: usize, offset: u64) -> Self {
        Self {
            chunk_size,
            pending: BytesMut::new(),
            offset,
        }
    }

    /// Takes one full chunk out of the pending bytes.
    pub(crate) fn pop(&mut self) -> Option<(Bytes, u64)> {
        if self.pending.len() < self.chunk_size {
            return None;
        }
        Some(self.emit(self.chunk_size))
    }

    /// Adds `data`, returning a chunk as soon as one is complete.
    pub(crate) fn push(&mut self, data: Bytes) -> Option<(Bytes, u64)> {
        if self.pending.is_empty() && data.len() == self.chunk_size {
            let offset = self.offset;
            self.offset += data.len() as u64;
            return Some((data, offset));
        }
        self.pending.extend_from_slice(&data);
        self.pop()
    }

    /// Emits the remainder as the final chunk.
    pub(crate) fn finish(&mut self) -> Option<(Bytes, u64)> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.emit(self.pending.len()))
    }

    fn emit(&mut self, len: usize) -> (Bytes, u64) {
        let data = self.pending.split_to(len).freeze();
        let offset = self.offset;
        self.offset += len as u64;
        (data, offset)
    }
}
