//! Chunked-container adapter: defers everything to an external store.

use std::ops::Range;

use bytes::Bytes;
use tracing::debug;

use crate::config::ChunkOptions;
use crate::error::ProviderError;
use crate::flags::{Flags, Kind};
use crate::provider::{ByteProvider, ChunkIter, ChunkSource, ProviderState, Reblock};
use crate::store::{Axis, ChunkedStore, StoreIter};
use crate::util::check_range;
use crate::view::ByteView;

/// A provider over a [`ChunkedStore`].
///
/// Reads, chunking and append are delegated to the store along its leading
/// dimension. Chunks are re-blocked from whole rows, so any chunk size and
/// byte range work; appended data must be whole rows. The returned data is read-only: flags are READABLE (plus
/// CONSTANT for [`ContainerBytes::constant`]) and never WRITABLE.
///
/// # Example
///
/// ```
/// use byteprovider::{ByteProvider, ByteView, ChunkedVec, ContainerBytes};
///
/// let mut provider = ContainerBytes::new(ChunkedVec::new(4, 2)?)?;
/// provider.append(&ByteView::detached(&b"rowArowB"[..]))?;
///
/// assert_eq!(provider.total_length(), Some(8));
/// assert_eq!(provider.get(4..8)?.as_bytes()?, b"rowB");
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
#[derive(Debug)]
pub struct ContainerBytes<S> {
    state: ProviderState,
    store: S,
}

impl<S: ChunkedStore> ContainerBytes<S> {
    /// Wraps an appendable store (READABLE).
    pub fn new(store: S) -> Result<Self, ProviderError> {
        Self::with_flags(store, Flags::READABLE)
    }

    /// Wraps a store that must not grow through this provider
    /// (READABLE | CONSTANT).
    pub fn constant(store: S) -> Result<Self, ProviderError> {
        Self::with_flags(store, Flags::READABLE | Flags::CONSTANT)
    }

    fn with_flags(store: S, flags: Flags) -> Result<Self, ProviderError> {
        if store.row_bytes() == 0 {
            return Err(ProviderError::UnsupportedSource {
                message: "chunked store must have a non-zero row width",
            });
        }
        let state = ProviderState::new(Kind::Memory, flags)?;
        debug!(
            rows = store.rows(),
            row_bytes = store.row_bytes(),
            %flags,
            "container provider created"
        );
        Ok(Self { state, store })
    }

    /// Returns the wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the provider and returns the store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Returns the bytes selected by a multi-dimensional key.
    ///
    /// The view's offset is the byte offset of the first selected element.
    pub fn get_key(&self, key: &[Axis]) -> Result<ByteView, ProviderError> {
        let data = self.store.select(key)?;
        let row_bytes = self.store.row_bytes() as u64;
        let first_row = match key.first() {
            Some(axis) => axis.bounds(self.store.rows())?.start,
            None => 0,
        };
        let first_column = match key.get(1) {
            Some(axis) => axis.bounds(row_bytes)?.start,
            None => 0,
        };
        Ok(self.state.issue(data, first_row * row_bytes + first_column))
    }

    fn check_aligned(&self, len: u64) -> Result<(), ProviderError> {
        let unit = self.store.row_bytes();
        if len % unit as u64 != 0 {
            return Err(ProviderError::Misaligned { len, unit });
        }
        Ok(())
    }
}

impl<S: ChunkedStore> ByteProvider for ContainerBytes<S> {
    fn kind(&self) -> Kind {
        self.state.kind()
    }

    fn flags(&self) -> Flags {
        self.state.flags()
    }

    fn is_appendable(&self) -> bool {
        true
    }

    fn total_length(&self) -> Option<u64> {
        Some(self.store.byte_len())
    }

    fn get(&self, range: Range<u64>) -> Result<ByteView, ProviderError> {
        check_range(&range, self.store.byte_len())?;
        let data = self.store.read(range.clone())?;
        Ok(self.state.issue(data, range.start))
    }

    fn iter_chunks(&mut self, options: ChunkOptions) -> Result<ChunkIter<'_>, ProviderError> {
        let row_bytes = self.store.row_bytes();
        let len = self.store.byte_len();
        let default_chunk = self.store.chunk_rows().max(1) * row_bytes;
        let plan = options.resolve(default_chunk, Some(len))?;
        let stop = plan.stop.unwrap_or(len);

        // Whole rows are read from the store and re-blocked to the byte
        // chunk size, so neither needs to fall on a row boundary.
        let unit = row_bytes as u64;
        let rows_per_chunk = plan.chunk_size.div_ceil(row_bytes);
        let start_row = plan.start / unit;
        let stop_row = stop.div_ceil(unit);

        let source = StoreChunks {
            inner: self.store.iter_rows(rows_per_chunk, start_row, stop_row),
            skip: (plan.start - start_row * unit) as usize,
            remaining: stop.saturating_sub(plan.start),
            reblock: Reblock::new(plan.chunk_size, plan.start),
            drained: stop <= plan.start,
        };
        let guard = self.state.begin_iteration()?;
        Ok(ChunkIter::new(guard, ChunkSource::Store(source)))
    }

    fn append(&mut self, view: &ByteView) -> Result<(), ProviderError> {
        self.state.check_not_constant("append")?;
        let data = view.as_bytes()?;
        self.check_aligned(data.len() as u64)?;
        self.store.append_rows(&data)?;
        self.state.invalidate();
        debug!(len = data.len(), rows = self.store.rows(), "rows appended");
        Ok(())
    }
}

/// Store rows trimmed to the requested byte range and re-blocked.
pub(crate) struct StoreChunks<'a> {
    inner: StoreIter<'a>,
    /// Bytes to drop from the front of the first row chunk.
    skip: usize,
    /// Bytes still wanted from the store.
    remaining: u64,
    reblock: Reblock,
    drained: bool,
}

impl StoreChunks<'_> {
    pub(crate) fn next_chunk(&mut self) -> Option<Result<(Bytes, u64), ProviderError>> {
        loop {
            if let Some(chunk) = self.reblock.pop() {
                return Some(Ok(chunk));
            }
            if self.drained {
                return self.reblock.finish().map(Ok);
            }

            let mut data = match self.inner.next() {
                Some(Ok(data)) => data,
                Some(Err(e)) => {
                    self.drained = true;
                    return Some(Err(e));
                }
                None => {
                    self.drained = true;
                    continue;
                }
            };
            if self.skip > 0 {
                let skip = self.skip.min(data.len());
                data = data.slice(skip..);
                self.skip -= skip;
            }
            if data.len() as u64 >= self.remaining {
                data.truncate(self.remaining as usize);
                self.drained = true;
            }
            self.remaining -= data.len() as u64;
            if let Some(chunk) = self.reblock.push(data) {
                return Some(Ok(chunk));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChunkedVec;

    fn provider() -> ContainerBytes<ChunkedVec> {
        let data: Vec<u8> = (0..12).collect();
        ContainerBytes::new(ChunkedVec::from_rows(3, 2, &data).unwrap()).unwrap()
    }

    #[test]
    fn test_flags_and_kind() {
        let provider = provider();
        assert_eq!(provider.flags(), Flags::READABLE);
        assert!(provider.is_appendable());
        assert_eq!(provider.total_length(), Some(12));
    }

    #[test]
    fn test_default_chunking_uses_store_chunks() {
        let mut provider = provider();
        let lens: Vec<usize> = provider
            .iter_chunks(ChunkOptions::default())
            .unwrap()
            .map(|c| c.unwrap().len())
            .collect();
        assert_eq!(lens, [6, 6]);
    }

    fn chunks(provider: &mut ContainerBytes<ChunkedVec>, options: ChunkOptions) -> Vec<(Vec<u8>, u64)> {
        provider
            .iter_chunks(options)
            .unwrap()
            .map(|c| {
                let view = c.unwrap();
                (view.as_bytes().unwrap().to_vec(), view.offset())
            })
            .collect()
    }

    #[test]
    fn test_chunk_size_off_row_boundary() {
        let mut provider = provider();
        let got = chunks(&mut provider, ChunkOptions::new(4).unwrap());
        assert_eq!(
            got,
            vec![
                (vec![0, 1, 2, 3], 0),
                (vec![4, 5, 6, 7], 4),
                (vec![8, 9, 10, 11], 8)
            ]
        );
    }

    #[test]
    fn test_bounds_off_row_boundary() {
        let mut provider = provider();
        let options = ChunkOptions::new(3).unwrap().with_start(1).with_stop(11);
        let got = chunks(&mut provider, options);
        assert_eq!(
            got,
            vec![
                (vec![1, 2, 3], 1),
                (vec![4, 5, 6], 4),
                (vec![7, 8, 9], 7),
                (vec![10], 10)
            ]
        );

        let options = ChunkOptions::new(5).unwrap().with_start(4).with_stop(5);
        assert_eq!(chunks(&mut provider, options), vec![(vec![4], 4)]);

        let options = ChunkOptions::new(5).unwrap().with_start(7).with_stop(7);
        assert!(chunks(&mut provider, options).is_empty());
    }

    #[test]
    fn test_chunks_are_read_only() {
        let mut provider = provider();
        let mut chunks = provider.iter_chunks(ChunkOptions::new(3).unwrap()).unwrap();
        let mut first = chunks.next().unwrap().unwrap();
        assert!(matches!(
            first.as_mut_bytes(),
            Err(ProviderError::Capability { .. })
        ));
    }

    #[test]
    fn test_append_and_read_back() {
        let mut provider = provider();
        let before = provider.get(0..3).unwrap();
        provider.append(&ByteView::detached(&b"xyz"[..])).unwrap();

        assert_eq!(provider.total_length(), Some(15));
        assert_eq!(provider.get(12..15).unwrap().as_bytes().unwrap(), b"xyz");
        assert!(before.is_stale());
    }

    #[test]
    fn test_append_misaligned() {
        let mut provider = provider();
        assert!(matches!(
            provider.append(&ByteView::detached(&b"xy"[..])),
            Err(ProviderError::Misaligned { .. })
        ));
        assert_eq!(provider.total_length(), Some(12));
    }

    #[test]
    fn test_constant_container_rejects_append() {
        let mut provider = ContainerBytes::constant(ChunkedVec::new(1, 1).unwrap()).unwrap();
        assert!(matches!(
            provider.append(&ByteView::detached(&b"x"[..])),
            Err(ProviderError::Capability { .. })
        ));
    }

    #[test]
    fn test_get_key() {
        let provider = provider();
        let view = provider.get_key(&[Axis::Range(1..3), Axis::Index(0)]).unwrap();
        assert_eq!(view.as_bytes().unwrap(), &[3, 6]);
        assert_eq!(view.offset(), 3);
    }
}
