//! Internal utility functions and helpers.
//!
//! This module contains small helper functions used by the adapters.
//! It is an implementation detail and not part of the public API.

use std::ops::Range;

use bytes::{Bytes, BytesMut};

use crate::error::ProviderError;

/// Checks `range` against `len` and converts it to slice indices.
pub(crate) fn check_range(range: &Range<u64>, len: u64) -> Result<Range<usize>, ProviderError> {
    if range.start > range.end || range.end > len {
        return Err(ProviderError::out_of_bounds(range, len));
    }
    Ok(range.start as usize..range.end as usize)
}

/// Returns `offset..offset + len` if it fits inside `total` bytes.
pub(crate) fn span_at(offset: u64, len: usize, total: u64) -> Result<Range<u64>, ProviderError> {
    let end = offset
        .checked_add(len as u64)
        .ok_or(ProviderError::OutOfBounds {
            start: offset,
            end: u64::MAX,
            len: total,
        })?;
    let range = offset..end;
    check_range(&range, total)?;
    Ok(range)
}

/// Overwrites `data` at `offset` with `src`.
///
/// The buffer is modified in place when this is its only handle; otherwise
/// it is copied first, leaving outstanding handles on the old contents.
pub(crate) fn write_bytes(data: &mut Bytes, offset: u64, src: &[u8]) -> Result<(), ProviderError> {
    let range = span_at(offset, src.len(), data.len() as u64)?;
    let span = range.start as usize..range.end as usize;

    let mut owned = match std::mem::take(data).try_into_mut() {
        Ok(unique) => unique,
        Err(shared) => BytesMut::from(&shared[..]),
    };
    owned[span].copy_from_slice(src);
    *data = owned.freeze();
    Ok(())
}

/// Joins buffers into one Bytes object.
///
/// A single part is passed through without copying.
pub(crate) fn combine_bytes(mut parts: Vec<Bytes>) -> Bytes {
    match parts.len() {
        0 => Bytes::new(),
        1 => parts.remove(0),
        _ => {
            let mut combined = BytesMut::with_capacity(parts.iter().map(Bytes::len).sum());
            for part in &parts {
                combined.extend_from_slice(part);
            }
            combined.freeze()
        }
    }
}
