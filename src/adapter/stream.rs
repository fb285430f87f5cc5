//! Stream adapter: a forward-only source of unknown length.

use std::io::{self, Read};
use std::ops::Range;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::config::{ChunkOptions, DEFAULT_CHUNK_SIZE};
use crate::error::ProviderError;
use crate::flags::{Flags, Kind};
use crate::provider::{ByteProvider, ChunkIter, ChunkSource, ProviderState};
use crate::view::ByteView;

/// A provider over any [`std::io::Read`] source.
///
/// Streams have no known length and cannot be reread: ranged `get` is
/// refused, and `iter_chunks` can be called exactly once. Every chunk is
/// filled to `chunk_size` bytes unless the stream ends first.
///
/// # Example
///
/// ```
/// use byteprovider::{ByteProvider, ChunkOptions, ProviderError, StreamBytes};
/// use std::io::Cursor;
///
/// let mut provider = StreamBytes::new(Cursor::new(vec![1u8; 10]))?;
/// assert_eq!(provider.total_length(), None);
///
/// let total: usize = provider
///     .iter_chunks(ChunkOptions::new(4)?)?
///     .map(|chunk| chunk.map(|view| view.len()))
///     .sum::<Result<usize, _>>()?;
/// assert_eq!(total, 10);
///
/// assert!(matches!(
///     provider.iter_chunks(ChunkOptions::default()),
///     Err(ProviderError::ExhaustedSource)
/// ));
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
#[derive(Debug)]
pub struct StreamBytes<R> {
    state: ProviderState,
    reader: R,
}

impl<R: Read> StreamBytes<R> {
    /// Wraps a reader.
    pub fn new(reader: R) -> Result<Self, ProviderError> {
        let state = ProviderState::new(Kind::Stream, Flags::READABLE)?;
        debug!("stream provider created");
        Ok(Self { state, reader })
    }

    /// Returns true once the stream has been iterated.
    pub fn is_exhausted(&self) -> bool {
        self.state.phase() == crate::provider::Phase::Exhausted
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteProvider for StreamBytes<R> {
    fn kind(&self) -> Kind {
        self.state.kind()
    }

    fn flags(&self) -> Flags {
        self.state.flags()
    }

    fn total_length(&self) -> Option<u64> {
        None
    }

    fn get(&self, _range: Range<u64>) -> Result<ByteView, ProviderError> {
        Err(ProviderError::UnsupportedOperation {
            operation: "get",
            kind: self.state.kind(),
        })
    }

    fn iter_chunks(&mut self, options: ChunkOptions) -> Result<ChunkIter<'_>, ProviderError> {
        let plan = options.resolve(DEFAULT_CHUNK_SIZE, None)?;
        let guard = self.state.begin_iteration()?;
        let source = ReaderChunks::new(&mut self.reader, plan.chunk_size, plan.start, plan.stop);
        Ok(ChunkIter::new(guard, ChunkSource::Reader(source)))
    }
}

/// Reads fixed-size chunks from a reader, skipping up to `start` and
/// stopping at `stop`.
pub(crate) struct ReaderChunks<'a> {
    reader: &'a mut (dyn Read + 'a),
    chunk_size: usize,
    skip: u64,
    remaining: Option<u64>,
    offset: u64,
    finished: bool,
}

impl<'a> ReaderChunks<'a> {
    pub(crate) fn new(
        reader: &'a mut (dyn Read + 'a),
        chunk_size: usize,
        start: u64,
        stop: Option<u64>,
    ) -> Self {
        Self {
            reader,
            chunk_size,
            skip: start,
            remaining: stop.map(|stop| stop.saturating_sub(start)),
            offset: 0,
            finished: false,
        }
    }

    pub(crate) fn next_chunk(&mut self) -> Option<Result<(Bytes, u64), ProviderError>> {
        if self.finished {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e.into()))
            }
        }
    }

    fn read_chunk(&mut self) -> io::Result<Option<(Bytes, u64)>> {
        if self.skip > 0 {
            let skipped = io::copy(&mut (&mut *self.reader).take(self.skip), &mut io::sink())?;
            self.offset += skipped;
            if skipped < self.skip {
                return Ok(None);
            }
            self.skip = 0;
        }

        let want = match self.remaining {
            Some(remaining) => remaining.min(self.chunk_size as u64) as usize,
            None => self.chunk_size,
        };
        if want == 0 {
            return Ok(None);
        }

        let mut buf = BytesMut::zeroed(want);
        let mut filled = 0;
        while filled < want {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if filled < want {
            self.finished = true;
        }
        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        let offset = self.offset;
        self.offset += filled as u64;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= filled as u64;
        }
        Ok(Some((buf.freeze(), offset)))
    }
}
