//! Error types for byteprovider.

use std::fmt;

use crate::flags::{Flags, Kind};

/// Errors that can occur when constructing or using a byte provider.
///
/// None of these are transient: each one is either a contract violation or
/// an exhausted source, so nothing in the crate retries on them.
#[derive(Debug)]
pub enum ProviderError {
    /// The supplied source does not have the shape the adapter requires.
    UnsupportedSource {
        /// Description of what was wrong with the source.
        message: &'static str,
    },

    /// A mutation was attempted without WRITABLE, or on a CONSTANT provider.
    Capability {
        /// The operation that was refused.
        operation: &'static str,
        /// The provider flags at the time of the call.
        flags: Flags,
    },

    /// The requested range exceeds the provider's total length.
    OutOfBounds {
        /// Requested start offset.
        start: u64,
        /// Requested end offset (exclusive).
        end: u64,
        /// Total length of the provider.
        len: u64,
    },

    /// The operation is not defined for this kind of provider.
    UnsupportedOperation {
        /// The operation that was refused.
        operation: &'static str,
        /// The kind of the provider.
        kind: Kind,
    },

    /// A stream was already consumed by an earlier iteration.
    ExhaustedSource,

    /// A view was used after its provider was mutated or dropped.
    StaleView,

    /// An I/O error occurred while opening, mapping or reading the source.
    SourceIo(std::io::Error),

    /// Invalid chunking parameter.
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// Data or offsets are not a whole number of leading-dimension units.
    Misaligned {
        /// The offending length or offset.
        len: u64,
        /// The unit size it must be a multiple of.
        unit: usize,
    },
}

impl ProviderError {
    pub(crate) fn out_of_bounds(range: &std::ops::Range<u64>, len: u64) -> Self {
        ProviderError::OutOfBounds {
            start: range.start,
            end: range.end,
            len,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::UnsupportedSource { message } => {
                write!(f, "unsupported source: {}", message)
            }
            ProviderError::Capability { operation, flags } => {
                write!(f, "{} not permitted with flags {}", operation, flags)
            }
            ProviderError::OutOfBounds { start, end, len } => {
                write!(f, "range {}..{} out of bounds (len {})", start, end, len)
            }
            ProviderError::UnsupportedOperation { operation, kind } => {
                write!(f, "{} is not supported by {} providers", operation, kind)
            }
            ProviderError::ExhaustedSource => write!(f, "source already exhausted"),
            ProviderError::StaleView => write!(f, "view invalidated by a provider mutation"),
            ProviderError::SourceIo(e) => write!(f, "source io error: {}", e),
            ProviderError::InvalidConfig { message } => {
                write!(f, "invalid config: {}", message)
            }
            ProviderError::Misaligned { len, unit } => {
                write!(f, "{} is not a multiple of {} bytes", len, unit)
            }
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::SourceIo(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(e: std::io::Error) -> Self {
        ProviderError::SourceIo(e)
    }
}
