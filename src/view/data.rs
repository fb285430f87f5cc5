//! The ByteView type - a window over provider bytes.

use std::fmt;
use std::ops::{Deref, Range};
use std::sync::{Arc, Weak};

use bytes::{Bytes, BytesMut};

use super::storage::{Region, region_bytes};
use crate::error::ProviderError;
use crate::flags::Flags;
use crate::provider::Shared;

/// A window over a run of bytes produced by a [`ByteProvider`](crate::ByteProvider).
///
/// The view holds a cheap handle onto the provider's storage and a weak
/// back-reference to the provider. It stays valid until the provider is
/// dropped or mutated (`append`, `write_at`); after that every access fails
/// with [`ProviderError::StaleView`].
///
/// Views over a file mapping never keep the mapping alive: closing the
/// provider unmaps the file and leaves such views stale.
///
/// # Example
///
/// ```
/// use byteprovider::{ByteProvider, MemoryBytes};
///
/// let provider = MemoryBytes::new(&b"hello world"[..])?;
/// let view = provider.get(0..5)?;
///
/// assert_eq!(view.len(), 5);
/// assert_eq!(view.as_bytes()?, b"hello");
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
#[derive(Clone)]
pub struct ByteView {
    data: ViewData,
    offset: u64,
    origin: Option<Origin>,
}

/// What a view points at.
#[derive(Clone)]
pub(crate) enum ViewData {
    Shared(Bytes),
    /// Private copy taken on first mutable access.
    Owned(BytesMut),
    /// Window onto a region only the provider owns.
    Mapped {
        region: Weak<Region>,
        span: Range<usize>,
    },
}

impl ViewData {
    pub(crate) fn len(&self) -> usize {
        match self {
            ViewData::Shared(b) => b.len(),
            ViewData::Owned(b) => b.len(),
            ViewData::Mapped { span, .. } => span.len(),
        }
    }
}

impl From<Bytes> for ViewData {
    fn from(data: Bytes) -> Self {
        ViewData::Shared(data)
    }
}

#[derive(Clone)]
struct Origin {
    shared: Weak<Shared>,
    epoch: u64,
}

impl ByteView {
    pub(crate) fn issued(data: ViewData, offset: u64, shared: Weak<Shared>, epoch: u64) -> Self {
        Self {
            data,
            offset,
            origin: Some(Origin { shared, epoch }),
        }
    }

    /// Creates a view that belongs to no provider, e.g. as input to `append`.
    ///
    /// Detached views never go stale and are always mutable.
    pub fn detached(data: impl Into<Bytes>) -> Self {
        Self {
            data: ViewData::Shared(data.into()),
            offset: 0,
            origin: None,
        }
    }

    /// Returns the length of the view in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the view covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the logical offset of the first byte within the provider.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the logical range covered by the view.
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset + self.len() as u64
    }

    /// Returns true if the originating provider was mutated or dropped.
    pub fn is_stale(&self) -> bool {
        if let ViewData::Mapped { region, .. } = &self.data {
            if region.strong_count() == 0 {
                return true;
            }
        }
        match &self.origin {
            None => false,
            Some(origin) => match origin.shared.upgrade() {
                Some(shared) => shared.epoch() != origin.epoch,
                None => true,
            },
        }
    }

    /// Returns the originating provider's current flags.
    ///
    /// `None` for detached views and views whose provider was dropped.
    pub fn origin_flags(&self) -> Option<Flags> {
        let origin = self.origin.as_ref()?;
        origin.shared.upgrade().map(|shared| shared.flags())
    }

    fn check_fresh(&self) -> Result<(), ProviderError> {
        if self.is_stale() {
            return Err(ProviderError::StaleView);
        }
        Ok(())
    }

    /// Returns the viewed bytes.
    ///
    /// For file-backed views the returned handle pins the mapping until it
    /// is dropped, so keep it short-lived.
    pub fn as_bytes(&self) -> Result<ViewBytes<'_>, ProviderError> {
        self.check_fresh()?;
        let repr = match &self.data {
            ViewData::Shared(b) => Repr::Slice(b),
            ViewData::Owned(b) => Repr::Slice(b),
            ViewData::Mapped { region, span } => {
                let region = region.upgrade().ok_or(ProviderError::StaleView)?;
                Repr::Mapped(region, span.clone())
            }
        };
        Ok(ViewBytes { repr })
    }

    /// Returns mutable access to the viewed bytes.
    ///
    /// Requires the originating provider to be WRITABLE and not CONSTANT at
    /// the time of the call. Writes land in a private copy held by this
    /// view; use [`ByteProvider::write_at`](crate::ByteProvider::write_at)
    /// to store them back.
    pub fn as_mut_bytes(&mut self) -> Result<&mut [u8], ProviderError> {
        self.check_fresh()?;
        if let Some(flags) = self.origin_flags() {
            if !flags.is_mutable() {
                return Err(ProviderError::Capability {
                    operation: "mutable byte access",
                    flags,
                });
            }
        }

        let owned = match &mut self.data {
            ViewData::Owned(_) => None,
            ViewData::Shared(bytes) => Some(
                std::mem::take(bytes)
                    .try_into_mut()
                    .unwrap_or_else(|shared| BytesMut::from(&shared[..])),
            ),
            ViewData::Mapped { region, span } => {
                let region = region.upgrade().ok_or(ProviderError::StaleView)?;
                Some(BytesMut::from(&region_bytes(&*region)[span.clone()]))
            }
        };
        if let Some(owned) = owned {
            self.data = ViewData::Owned(owned);
        }

        match &mut self.data {
            ViewData::Owned(b) => Ok(&mut b[..]),
            _ => unreachable!("converted above"),
        }
    }

    /// Consumes the view and returns its bytes.
    ///
    /// File-backed views are copied out of the mapping.
    pub fn into_bytes(self) -> Result<Bytes, ProviderError> {
        self.check_fresh()?;
        Ok(match self.data {
            ViewData::Shared(b) => b,
            ViewData::Owned(b) => b.freeze(),
            ViewData::Mapped { region, span } => {
                let region = region.upgrade().ok_or(ProviderError::StaleView)?;
                Bytes::copy_from_slice(&region_bytes(&*region)[span])
            }
        })
    }

    /// Computes the BLAKE3 digest of the viewed bytes.
    #[cfg(feature = "hash-blake3")]
    pub fn digest(&self) -> Result<super::ViewDigest, ProviderError> {
        Ok(crate::hash::Blake3Hasher::hash(&self.as_bytes()?))
    }
}

impl From<Bytes> for ByteView {
    fn from(data: Bytes) -> Self {
        Self::detached(data)
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(data: Vec<u8>) -> Self {
        Self::detached(data)
    }
}

impl From<&'static [u8]> for ByteView {
    fn from(data: &'static [u8]) -> Self {
        Self::detached(data)
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("len", &self.len())
            .field("offset", &self.offset)
            .field("detached", &self.origin.is_none())
            .field("stale", &self.is_stale())
            .finish()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({} bytes @ {}", self.len(), self.offset)?;
        if self.is_stale() {
            write!(f, ", stale")?;
        }
        write!(f, ")")
    }
}

/// Read access to a view's bytes, returned by [`ByteView::as_bytes`].
///
/// Dereferences to `[u8]`.
pub struct ViewBytes<'a> {
    repr: Repr<'a>,
}

enum Repr<'a> {
    Slice(&'a [u8]),
    Mapped(Arc<Region>, Range<usize>),
}

impl Deref for ViewBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.repr {
            Repr::Slice(b) => b,
            Repr::Mapped(region, span) => &region_bytes(&**region)[span.clone()],
        }
    }
}

impl AsRef<[u8]> for ViewBytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl fmt::Debug for ViewBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl PartialEq<[u8]> for ViewBytes<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        **self == *other
    }
}

impl PartialEq<&[u8]> for ViewBytes<'_> {
    fn eq(&self, other: &&[u8]) -> bool {
        **self == **other
    }
}

impl<const N: usize> PartialEq<[u8; N]> for ViewBytes<'_> {
    fn eq(&self, other: &[u8; N]) -> bool {
        **self == other[..]
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for ViewBytes<'_> {
    fn eq(&self, other: &&[u8; N]) -> bool {
        **self == other[..]
    }
}

impl PartialEq<Vec<u8>> for ViewBytes<'_> {
    fn eq(&self, other: &Vec<u8>) -> bool {
        **self == other[..]
    }
}
