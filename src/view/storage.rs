//! Provider-side storage and the handles views keep onto it.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;

use super::data::ViewData;

/// Memory a provider maps in and must release itself (e.g. a file mapping).
pub(crate) type Region = dyn AsRef<[u8]> + Send + Sync;

pub(crate) fn region_bytes(region: &Region) -> &[u8] {
    <Region as AsRef<[u8]>>::as_ref(region)
}

/// Bytes held by a provider.
///
/// `Shared` buffers are handed to views by refcount. A `Mapped` region is
/// owned by the provider alone: views only get a `Weak`, so dropping the
/// provider releases the region even while views are still around.
#[derive(Clone)]
pub(crate) enum Storage {
    Shared(Bytes),
    Mapped(Arc<Region>),
}

impl Storage {
    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Shared(b) => b,
            Storage::Mapped(region) => region_bytes(&**region),
        }
    }

    /// View payload over `span`, which must be in bounds.
    pub(crate) fn window(&self, span: Range<usize>) -> ViewData {
        match self {
            Storage::Shared(b) => ViewData::Shared(b.slice(span)),
            Storage::Mapped(region) => ViewData::Mapped {
                region: Arc::downgrade(region),
                span,
            },
        }
    }
}

impl From<Bytes> for Storage {
    fn from(data: Bytes) -> Self {
        Storage::Shared(data)
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Shared(b) => f.debug_tuple("Shared").field(&b.len()).finish(),
            Storage::Mapped(region) => f
                .debug_tuple("Mapped")
                .field(&region_bytes(&**region).len())
                .finish(),
        }
    }
}
