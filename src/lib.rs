//! byteprovider
//!
//! Uniform byte providers over heterogeneous backing stores.
//!
//! A [`ByteProvider`] exposes bytes that may live in process memory, in a
//! memory-mapped file, behind a forward-only stream, or inside an external
//! chunked store, through one set of operations:
//!
//! - `total_length()` - exact length, or `None` for streams
//! - `get(range)` - random access as a [`ByteView`]
//! - `iter_chunks(options)` - lazy, forward-only chunk views
//! - `append(view)` / `write_at(offset, data)` - where the adapter allows it
//!
//! [`Flags`] declare what is legal on each instance (READABLE, WRITABLE,
//! CONSTANT), and every refusal is a [`ProviderError`] variant rather than a
//! missing method.
//!
//! The crate intentionally:
//! - does NOT pick an adapter for an arbitrary input
//! - does NOT interpret bytes as shapes or element types
//! - does NOT compress, encrypt or transport data
//!
//! Unsafe code is denied crate-wide. The one exception is the
//! memory-mapping call in [`FileBytes`], which carries its own `SAFETY`
//! note; views over a mapping never outlive it, because they hold only a
//! weak handle and go stale once the provider closes.
//!
//! # Example
//!
//! ```no_run
//! use byteprovider::{ByteProvider, ChunkOptions, FileBytes, ProviderError};
//!
//! fn main() -> Result<(), ProviderError> {
//!     let mut provider = FileBytes::open("data.bin")?;
//!     println!("{} bytes, flags {}", provider.total_length().unwrap_or(0), provider.flags());
//!
//!     let tail = provider.get(90..100)?;
//!     println!("tail: {:?}", tail.as_bytes()?);
//!
//!     for chunk in provider.iter_chunks(ChunkOptions::new(4096)?)? {
//!         let chunk = chunk?;
//!         println!("chunk {} bytes @ {}", chunk.len(), chunk.offset());
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod error;
mod flags;
mod provider;
mod store;
mod view;

mod hash; // internal blake3 impl
mod util;

//
// Public surface
//

pub use adapter::{
    ChainBytes, ChainMember, ContainerBytes, FileBytes, FileMode, FileSpec, FillBytes, FillSpec,
    MemoryBytes, StreamBytes,
};
pub use config::{ChunkOptions, DEFAULT_CHUNK_SIZE};
pub use error::ProviderError;
pub use flags::{Flags, Kind};
pub use provider::{ByteProvider, ChunkIter};
pub use store::{Axis, ChunkedStore, ChunkedVec, StoreIter};
pub use view::{ByteView, ViewBytes};

#[cfg(feature = "hash")]
pub use view::ViewDigest;
