//! View types.
//!
//! - [`ByteView`] - Non-owning window over bytes yielded by a provider
//! - [`ViewBytes`] - Read access handed out by [`ByteView::as_bytes`]
//! - [`ViewDigest`] - 32-byte content digest of a view (feature `hash`)

mod data;
#[cfg(feature = "hash")]
mod digest;
mod storage;

pub use data::{ByteView, ViewBytes};
#[cfg(feature = "hash")]
pub use digest::ViewDigest;

pub(crate) use data::ViewData;
pub(crate) use storage::{Region, Storage};
