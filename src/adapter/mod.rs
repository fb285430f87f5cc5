//! Backing-kind adapters.
//!
//! - [`MemoryBytes`] - Resident buffer
//! - [`FillBytes`] - Synthesized buffer of one repeated value
//! - [`FileBytes`] - Memory-mapped file region
//! - [`StreamBytes`] - Forward-only reader
//! - [`ContainerBytes`] - External chunked store
//! - [`ChainBytes`] - Ordered sequence of providers

mod chain;
mod container;
mod file;
mod fill;
mod memory;
mod stream;

pub use chain::{ChainBytes, ChainMember};
pub use container::ContainerBytes;
pub use file::{FileBytes, FileMode, FileSpec};
pub use fill::{FillBytes, FillSpec};
pub use memory::MemoryBytes;
pub use stream::StreamBytes;

pub(crate) use chain::ChainChunks;
pub(crate) use container::StoreChunks;
pub(crate) use stream::ReaderChunks;
