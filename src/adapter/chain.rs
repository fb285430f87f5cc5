//! Chain adapter: an ordered sequence of providers read end to end.

use std::ops::Range;

use bytes::Bytes;
use tracing::debug;

use crate::config::{ChunkOptions, DEFAULT_CHUNK_SIZE};
use crate::error::ProviderError;
use crate::flags::{Flags, Kind};
use crate::provider::{ByteProvider, ChunkIter, ChunkSource, ProviderState, Reblock};
use crate::util::{check_range, combine_bytes, span_at};
use crate::view::ByteView;

/// Boxed chain member.
pub type ChainMember = Box<dyn ByteProvider>;

/// A provider that concatenates other providers along one dimension.
///
/// Only the final member may be a stream, since a stream cannot be resumed
/// once passed; this is checked at construction. A chain ending in a
/// stream has unknown length and inherits the stream's single-pass rules.
///
/// Flags are the intersection of the members' READABLE and WRITABLE bits;
/// CONSTANT is set only if every member is CONSTANT.
///
/// # Example
///
/// ```
/// use byteprovider::{ByteProvider, ChainBytes, FillBytes, FillSpec, MemoryBytes};
///
/// let chain = ChainBytes::new(vec![
///     Box::new(MemoryBytes::new(&b"head"[..])?),
///     Box::new(FillBytes::new(FillSpec::new(2, b'!' as u64, 1))?),
/// ])?;
///
/// assert_eq!(chain.total_length(), Some(6));
/// assert_eq!(chain.get(2..6)?.as_bytes()?, b"ad!!");
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
pub struct ChainBytes {
    state: ProviderState,
    members: Vec<ChainMember>,
}

impl ChainBytes {
    /// Builds a chain, rejecting empty chains and non-final streams.
    pub fn new(members: Vec<ChainMember>) -> Result<Self, ProviderError> {
        let Some((last, init)) = members.split_last() else {
            return Err(ProviderError::UnsupportedSource {
                message: "chain needs at least one member",
            });
        };
        if init.iter().any(|m| m.kind().is_stream()) {
            return Err(ProviderError::UnsupportedSource {
                message: "only the final member of a chain may be a stream",
            });
        }

        let kind = if last.kind().is_stream() {
            Kind::Stream
        } else if members.iter().any(|m| m.kind() == Kind::File) {
            Kind::File
        } else if members.iter().any(|m| m.kind() == Kind::Device) {
            Kind::Device
        } else {
            Kind::Memory
        };

        let mut flags = Flags::READABLE | Flags::WRITABLE | Flags::CONSTANT;
        for member in &members {
            let member_flags = member.flags();
            for flag in [Flags::READABLE, Flags::WRITABLE, Flags::CONSTANT] {
                if !member_flags.has(flag) {
                    flags = flags.without(flag);
                }
            }
        }

        let state = ProviderState::new(kind, flags)?;
        debug!(members = members.len(), %kind, %flags, "chain provider created");
        Ok(Self { state, members })
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false: chains have at least one member.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `(start offset, member)` pairs for members of known length.
    fn placed(&self) -> impl Iterator<Item = (u64, &ChainMember)> {
        let mut base = 0u64;
        self.members.iter().map_while(move |member| {
            let len = member.total_length()?;
            let start = base;
            base += len;
            Some((start, member))
        })
    }

    fn known_length(&self, operation: &'static str) -> Result<u64, ProviderError> {
        self.total_length().ok_or(ProviderError::UnsupportedOperation {
            operation,
            kind: self.state.kind(),
        })
    }
}

impl ByteProvider for ChainBytes {
    fn kind(&self) -> Kind {
        self.state.kind()
    }

    fn flags(&self) -> Flags {
        self.state.flags()
    }

    fn is_appendable(&self) -> bool {
        self.members.last().is_some_and(|m| m.is_appendable())
    }

    fn total_length(&self) -> Option<u64> {
        self.members.iter().map(|m| m.total_length()).sum()
    }

    fn get(&self, range: Range<u64>) -> Result<ByteView, ProviderError> {
        let len = self.known_length("get")?;
        check_range(&range, len)?;

        let mut parts = Vec::new();
        for (start, member) in self.placed() {
            let end = start + member.total_length().unwrap_or(0);
            if end <= range.start || start >= range.end {
                continue;
            }
            let local = range.start.max(start) - start..range.end.min(end) - start;
            parts.push(member.get(local)?.into_bytes()?);
        }

        let data = combine_bytes(parts);
        Ok(self.state.issue(data, range.start))
    }

    fn iter_chunks(&mut self, options: ChunkOptions) -> Result<ChunkIter<'_>, ProviderError> {
        let plan = options.resolve(DEFAULT_CHUNK_SIZE, self.total_length())?;
        let guard = self.state.begin_iteration()?;
        let source = ChainChunks {
            members: self.members.iter_mut(),
            current: None,
            base: 0,
            start: plan.start,
            stop: plan.stop,
            chunk_size: plan.chunk_size,
            reblock: Reblock::new(plan.chunk_size, plan.start),
            drained: false,
        };
        Ok(ChunkIter::new(guard, ChunkSource::Chain(source)))
    }

    fn append(&mut self, view: &ByteView) -> Result<(), ProviderError> {
        self.state.check_not_constant("append")?;
        let last = self.members.last_mut().ok_or(ProviderError::UnsupportedSource {
            message: "chain needs at least one member",
        })?;
        last.append(view)?;
        self.state.invalidate();
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<(), ProviderError> {
        self.state.check_writable("write_at")?;
        let range = span_at(offset, data.len(), self.known_length("write_at")?)?;

        let mut base = 0u64;
        for member in self.members.iter_mut() {
            let Some(len) = member.total_length() else {
                break;
            };
            let end = base + len;
            if end > range.start && base < range.end {
                let from = range.start.max(base);
                let to = range.end.min(end);
                let src = &data[(from - offset) as usize..(to - offset) as usize];
                member.write_at(from - base, src)?;
            }
            base = end;
        }
        self.state.invalidate();
        Ok(())
    }
}

/// Re-blocks member chunks so every chunk but the last is `chunk_size`.
pub(crate) struct ChainChunks<'a> {
    members: std::slice::IterMut<'a, ChainMember>,
    // Boxed: a member can itself be a chain.
    current: Option<Box<ChunkIter<'a>>>,
    /// Logical offset of the first byte of the next member.
    base: u64,
    start: u64,
    stop: Option<u64>,
    chunk_size: usize,
    reblock: Reblock,
    drained: bool,
}

impl ChainChunks<'_> {
    pub(crate) fn next_chunk(&mut self) -> Option<Result<(Bytes, u64), ProviderError>> {
        loop {
            if let Some(chunk) = self.reblock.pop() {
                return Some(Ok(chunk));
            }
            if self.drained {
                return self.reblock.finish().map(Ok);
            }

            let Some(current) = self.current.as_mut() else {
                if let Err(e) = self.open_next_member() {
                    self.drained = true;
                    return Some(Err(e));
                }
                continue;
            };

            match current.next() {
                Some(Ok(view)) => {
                    let data = match view.into_bytes() {
                        Ok(data) => data,
                        Err(e) => return Some(Err(e)),
                    };
                    if let Some(chunk) = self.reblock.push(data) {
                        return Some(Ok(chunk));
                    }
                }
                Some(Err(e)) => {
                    self.drained = true;
                    return Some(Err(e));
                }
                None => self.current = None,
            }
        }
    }

    /// Opens the next member overlapping `start..stop`, or marks the chain
    /// drained.
    fn open_next_member(&mut self) -> Result<(), ProviderError> {
        loop {
            if self.stop.is_some_and(|stop| self.base >= stop) {
                self.drained = true;
                return Ok(());
            }
            let Some(member) = self.members.next() else {
                self.drained = true;
                return Ok(());
            };

            let base = self.base;
            let local_start = self.start.saturating_sub(base);
            let local_stop = self.stop.map(|stop| stop - base);

            let options = match member.total_length() {
                Some(len) => {
                    self.base += len;
                    let local_stop = local_stop.map_or(len, |stop| stop.min(len));
                    if local_start >= local_stop {
                        continue;
                    }
                    ChunkOptions::default()
                        .with_chunk_size(self.chunk_size)
                        .with_start(local_start)
                        .with_stop(local_stop)
                }
                None => {
                    let mut options = ChunkOptions::default()
                        .with_chunk_size(self.chunk_size)
                        .with_start(local_start);
                    if let Some(stop) = local_stop {
                        options = options.with_stop(stop);
                    }
                    options
                }
            };

            self.current = Some(Box::new(member.iter_chunks(options)?));
            return Ok(());
        }
    }
}
