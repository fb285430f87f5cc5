//! BLAKE3-based view digests.

use crate::view::ViewDigest;

/// Computes BLAKE3 digests of viewed bytes.
#[derive(Debug, Clone, Default)]
pub(crate) struct Blake3Hasher {
    state: blake3::Hasher,
}

impl Blake3Hasher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    pub(crate) fn finalize(&self) -> ViewDigest {
        ViewDigest::new(self.state.finalize().into())
    }

    /// One-shot digest.
    pub(crate) fn hash(data: &[u8]) -> ViewDigest {
        ViewDigest::new(blake3::hash(data).into())
    }
}
