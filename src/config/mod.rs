//! Configuration for chunked iteration.
//!
//! - [`ChunkOptions`] - Chunk size and the `start`/`stop` region, per call
//!
//! There is no crate-wide chunk size: each call site passes its own
//! [`ChunkOptions`], and an unset chunk size falls back to the provider's
//! own default.
//!
//! # Example
//!
//! ```
//! use byteprovider::ChunkOptions;
//!
//! // Adapter default chunk size over the full extent
//! let options = ChunkOptions::default();
//!
//! // 4 KiB chunks over bytes 1024..
//! let options = ChunkOptions::new(4096)?.with_start(1024);
//! assert_eq!(options.chunk_size(), Some(4096));
//! # Ok::<(), byteprovider::ProviderError>(())
//! ```

use crate::error::ProviderError;

/// Default chunk size in bytes for file-backed and streaming providers.
pub const DEFAULT_CHUNK_SIZE: usize = 8000;

/// Options for [`ByteProvider::iter_chunks`](crate::ByteProvider::iter_chunks).
///
/// `start` and `stop` bound the logical region covered, defaulting to the
/// full extent. Every chunk is `chunk_size` bytes except possibly the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkOptions {
    chunk_size: Option<usize>,
    start: Option<u64>,
    stop: Option<u64>,
}

impl ChunkOptions {
    /// Creates options with an explicit chunk size.
    ///
    /// Returns [`ProviderError::InvalidConfig`] if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self, ProviderError> {
        let options = Self::default().with_chunk_size(chunk_size);
        options.validate()?;
        Ok(options)
    }

    /// Sets the chunk size.
    ///
    /// Note: This does not validate. Use [`ChunkOptions::validate`].
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Sets the first byte offset covered.
    pub fn with_start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the offset at which iteration stops (exclusive).
    pub fn with_stop(mut self, stop: u64) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Returns the explicit chunk size, if set.
    pub fn chunk_size(&self) -> Option<usize> {
        self.chunk_size
    }

    /// Returns the start offset, if set.
    pub fn start(&self) -> Option<u64> {
        self.start
    }

    /// Returns the stop offset, if set.
    pub fn stop(&self) -> Option<u64> {
        self.stop
    }

    /// Validates the options independently of any provider.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.chunk_size == Some(0) {
            return Err(ProviderError::InvalidConfig {
                message: "chunk size must be non-zero",
            });
        }
        if let (Some(start), Some(stop)) = (self.start, self.stop) {
            if start > stop {
                return Err(ProviderError::InvalidConfig {
                    message: "start cannot be greater than stop",
                });
            }
        }
        Ok(())
    }

    /// Resolves the options against a provider's default chunk size and
    /// total length (`None` for streams).
    pub(crate) fn resolve(
        &self,
        default_chunk: usize,
        total: Option<u64>,
    ) -> Result<ChunkPlan, ProviderError> {
        self.validate()?;
        let chunk_size = self.chunk_size.unwrap_or(default_chunk).max(1);
        let start = self.start.unwrap_or(0);

        let stop = match total {
            Some(len) => {
                let stop = self.stop.unwrap_or(len);
                if stop > len || start > len {
                    return Err(ProviderError::out_of_bounds(&(start..stop), len));
                }
                Some(stop)
            }
            None => self.stop,
        };

        Ok(ChunkPlan {
            chunk_size,
            start,
            stop,
        })
    }
}

/// Chunk options resolved against one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkPlan {
    pub(crate) chunk_size: usize,
    pub(crate) start: u64,
    /// `None` only for streams without an explicit stop.
    pub(crate) stop: Option<u64>,
}
