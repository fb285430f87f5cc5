//! Constant-fill adapter: a synthesized buffer of one repeated value.

use std::ops::Range;

use bytes::Bytes;
use tracing::debug;

use crate::config::ChunkOptions;
use crate::error::ProviderError;
use crate::flags::{Flags, Kind};
use crate::provider::{ByteProvider, ChunkIter, ChunkSource, ProviderState, SliceChunks};
use crate::util::{check_range, write_bytes};
use crate::view::ByteView;

/// Description of a fill: `count` elements of `width` bytes, each `value`.
///
/// Elements are encoded in native byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FillSpec {
    /// Number of elements.
    pub count: usize,
    /// Value repeated in every element.
    pub value: u64,
    /// Element width in bytes: 1, 2, 4 or 8.
    pub width: usize,
}

impl FillSpec {
    /// `count` elements of `width` bytes, each `value`.
    pub const fn new(count: usize, value: u64, width: usize) -> Self {
        Self {
            count,
            value,
            width,
        }
    }

    /// Total size of the fill in bytes.
    pub fn byte_len(&self) -> Option<usize> {
        self.count.checked_mul(self.width)
    }

    fn element(&self) -> Result<Vec<u8>, ProviderError> {
        let element = match self.width {
            1 => u8::try_from(self.value).map(|v| v.to_ne_bytes().to_vec()),
            2 => u16::try_from(self.value).map(|v| v.to_ne_bytes().to_vec()),
            4 => u32::try_from(self.value).map(|v| v.to_ne_bytes().to_vec()),
            8 => Ok(self.value.to_ne_bytes().to_vec()),
            _ => {
                return Err(ProviderError::UnsupportedSource {
                    message: "element width must be 1, 2, 4 or 8 bytes",
                });
            }
        };
        element.map_err(|_| ProviderError::UnsupportedSource {
            message: "fill value does not fit the element width",
        })
    }
}

impl From<usize> for FillSpec {
    /// `count` zero bytes.
    fn from(count: usize) -> Self {
        Self::new(count, 0, 1)
    }
}

/// A provider over a buffer filled with one repeated value.
///
/// The buffer is owned and fixed-size: no append. Flags default to
/// READABLE | WRITABLE; [`FillBytes::constant`] builds an immutable fill.
///
/// # Example
///
/// ```
/// use byteprovider::{ByteProvider, FillBytes, FillSpec};
///
/// let provider = FillBytes::new(FillSpec::new(16, 0xFF, 1))?;
/// assert_eq!(provider.total_length(), Some(16));
/// assert!(provider.read_all()?.as_bytes()?.iter().all(|&b| b == 0xFF));
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
#[derive(Debug)]
pub struct FillBytes {
    state: ProviderState,
    spec: FillSpec,
    data: Bytes,
}

impl FillBytes {
    /// Synthesizes a writable fill.
    pub fn new(spec: impl Into<FillSpec>) -> Result<Self, ProviderError> {
        Self::with_flags(spec, Flags::READABLE | Flags::WRITABLE)
    }

    /// Synthesizes an immutable fill (READABLE | CONSTANT).
    pub fn constant(spec: impl Into<FillSpec>) -> Result<Self, ProviderError> {
        Self::with_flags(spec, Flags::READABLE | Flags::CONSTANT)
    }

    /// Synthesizes a fill with explicit flags.
    pub fn with_flags(spec: impl Into<FillSpec>, flags: Flags) -> Result<Self, ProviderError> {
        let spec = spec.into();
        let element = spec.element()?;
        if spec.byte_len().is_none() {
            return Err(ProviderError::UnsupportedSource {
                message: "fill size overflows usize",
            });
        }
        let data = Bytes::from(element.repeat(spec.count));
        let state = ProviderState::new(Kind::Memory, flags)?;
        debug!(
            count = spec.count,
            width = spec.width,
            value = spec.value,
            %flags,
            "fill provider created"
        );
        Ok(Self { state, spec, data })
    }

    /// Returns the fill description this provider was built from.
    pub fn spec(&self) -> FillSpec {
        self.spec
    }
}

impl ByteProvider for FillBytes {
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
