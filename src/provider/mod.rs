//! The provider interface.
//!
//! - [`ByteProvider`] - Uniform contract implemented by every adapter
//! - [`ChunkIter`] - Lazy, forward-only sequence of chunk views
//!
//! # Lifecycle
//!
//! ```text
//! Idle --iter_chunks--> Iterating --drop ChunkIter--> Idle       (memory, file, ...)
//! Idle --iter_chunks--> Iterating --drop ChunkIter--> Exhausted  (streams, terminal)
//! ```
//!
//! `append` and `write_at` are legal only from `Idle`. Because a
//! [`ChunkIter`] borrows its provider mutably, mutation during iteration is
//! already rejected at compile time.

mod chunks;
mod state;

use std::ops::Range;

pub use chunks::ChunkIter;
pub(crate) use chunks::{ChunkSource, Reblock, SliceChunks};
pub(crate) use state::{IterationGuard, Phase, ProviderState, Shared};

use crate::config::ChunkOptions;
use crate::error::ProviderError;
use crate::flags::{Flags, Kind};
use crate::view::ByteView;

/// A uniform handle over a byte-bearing source.
///
/// Each operation is either implemented by an adapter or explicitly refused
/// with [`ProviderError::UnsupportedOperation`]; callers never have to work out
/// which kind of provider they hold.
///
/// # Example
///
/// ```
/// use byteprovider::{ByteProvider, ChunkOptions, MemoryBytes};
///
/// let mut provider = MemoryBytes::writable(b"0123456789".to_vec())?;
///
/// let lens: Vec<usize> = provider
///     .iter_chunks(ChunkOptions::new(4)?)?
///     .map(|chunk| chunk.map(|view| view.len()))
///     .collect::<Result<_, _>>()?;
/// assert_eq!(lens, [4, 4, 2]);
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
pub trait ByteProvider {
    /// Returns the physical class of the backing store.
    fn kind(&self) -> Kind;

    /// Returns the current capability flags.
    ///
    /// WRITABLE is suppressed while a [`ChunkIter`] is alive.
    fn flags(&self) -> Flags;

    /// Returns true if [`ByteProvider::append`] is supported.
    fn is_appendable(&self) -> bool {
        false
    }

    /// Returns the total length in bytes, or `None` for streams.
    fn total_length(&self) -> Option<u64>;

    /// Returns a view over `range`.
    ///
    /// Fails with [`ProviderError::OutOfBounds`] if the range exceeds the
    /// total length, and with [`ProviderError::UnsupportedOperation`] on
    /// streams.
    fn get(&self, range: Range<u64>) -> Result<ByteView, ProviderError>;

    /// Returns a view over the full extent.
    fn read_all(&self) -> Result<ByteView, ProviderError> {
        match self.total_length() {
            Some(len) => self.get(0..len),
            None => Err(ProviderError::UnsupportedOperation {
                operation: "read_all",
                kind: self.kind(),
            }),
        }
    }

    /// Returns a lazy sequence of chunk views.
    ///
    /// Every chunk is `chunk_size` bytes except possibly the last. Streams
    /// can be iterated once; a second call fails with
    /// [`ProviderError::ExhaustedSource`].
    fn iter_chunks(&mut self, options: ChunkOptions) -> Result<ChunkIter<'_>, ProviderError>;

    /// Appends `view` along the leading dimension.
    fn append(&mut self, view: &ByteView) -> Result<(), ProviderError> {
        let _ = view;
        let flags = self.flags();
        if flags.has(Flags::CONSTANT) {
            return Err(ProviderError::Capability {
                operation: "append",
                flags,
            });
        }
        Err(ProviderError::UnsupportedOperation {
            operation: "append",
            kind: self.kind(),
        })
    }

    /// Overwrites bytes starting at `offset`.
    ///
    /// Invalidates every view previously issued by this provider.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<(), ProviderError> {
        let _ = (offset, data);
        let flags = self.flags();
        if !flags.is_mutable() {
            return Err(ProviderError::Capability {
                operation: "write_at",
                flags,
            });
        }
        Err(ProviderError::UnsupportedOperation {
            operation: "write_at",
            kind: self.kind(),
        })
    }

    /// Computes the BLAKE3 digest of the region covered by `options`,
    /// one chunk at a time.
    #[cfg(feature = "hash-blake3")]
    fn digest(&mut self, options: ChunkOptions) -> Result<crate::ViewDigest, ProviderError> {
        let mut hasher = crate::hash::Blake3Hasher::new();
        for chunk in self.iter_chunks(options)? {
            hasher.update(&chunk?.as_bytes()?);
        }
        Ok(hasher.finalize())
    }
}
