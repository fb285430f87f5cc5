//! View digest type.

use std::fmt;

/// BLAKE3 digest of the bytes a view or provider range covers.
///
/// Equal digests mean equal bytes regardless of backing kind or chunk size,
/// so ranges from different providers compare without holding both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewDigest([u8; 32]);

impl ViewDigest {
    pub(crate) const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ViewDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}
