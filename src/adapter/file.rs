//! File-backed adapter over a read-only memory mapping.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};

use std::sync::Arc;

use bytes::Bytes;
use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::config::{ChunkOptions, DEFAULT_CHUNK_SIZE};
use crate::error::ProviderError;
use crate::flags::{Flags, Kind};
use crate::provider::{ByteProvider, ChunkIter, ChunkSource, ProviderState, SliceChunks};
use crate::util::check_range;
use crate::view::{ByteView, Region, Storage};

/// Mode used when a [`FileSpec`] opens a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileMode {
    /// `"r"` / `"rb"`
    #[default]
    Read,
    /// `"r+"` / `"r+b"` / `"rb+"`
    ReadWrite,
}

impl FileMode {
    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(true);
        if self == FileMode::ReadWrite {
            options.write(true);
        }
        options
    }
}

impl TryFrom<&str> for FileMode {
    type Error = ProviderError;

    /// Only modes that keep the existing contents are accepted.
    fn try_from(mode: &str) -> Result<Self, Self::Error> {
        match mode {
            "r" | "rb" => Ok(FileMode::Read),
            "r+" | "r+b" | "rb+" => Ok(FileMode::ReadWrite),
            _ => Err(ProviderError::UnsupportedSource {
                message: "file mode must be one of r, rb, r+, r+b, rb+",
            }),
        }
    }
}

/// Anything a [`FileBytes`] can be opened from.
#[derive(Debug)]
pub enum FileSpec {
    /// A path, opened read-only.
    Path(PathBuf),
    /// An already-open handle.
    Handle(File),
    /// A path with an explicit open mode.
    PathMode(PathBuf, FileMode),
}

impl FileSpec {
    fn open(self) -> Result<File, ProviderError> {
        let file = match self {
            FileSpec::Handle(file) => file,
            FileSpec::Path(path) => File::open(path)?,
            FileSpec::PathMode(path, mode) => mode.options().open(path)?,
        };
        Ok(file)
    }

    fn with_mode(path: PathBuf, mode: &str) -> Result<Self, ProviderError> {
        Ok(FileSpec::PathMode(path, FileMode::try_from(mode)?))
    }
}

impl From<File> for FileSpec {
    fn from(file: File) -> Self {
        FileSpec::Handle(file)
    }
}

impl From<PathBuf> for FileSpec {
    fn from(path: PathBuf) -> Self {
        FileSpec::Path(path)
    }
}

impl From<&Path> for FileSpec {
    fn from(path: &Path) -> Self {
        FileSpec::Path(path.to_path_buf())
    }
}

impl From<&str> for FileSpec {
    fn from(path: &str) -> Self {
        FileSpec::Path(PathBuf::from(path))
    }
}

impl From<String> for FileSpec {
    fn from(path: String) -> Self {
        FileSpec::Path(PathBuf::from(path))
    }
}

impl TryFrom<(&Path, &str)> for FileSpec {
    type Error = ProviderError;

    fn try_from((path, mode): (&Path, &str)) -> Result<Self, Self::Error> {
        FileSpec::with_mode(path.to_path_buf(), mode)
    }
}

impl TryFrom<(PathBuf, &str)> for FileSpec {
    type Error = ProviderError;

    fn try_from((path, mode): (PathBuf, &str)) -> Result<Self, Self::Error> {
        FileSpec::with_mode(path, mode)
    }
}

impl TryFrom<(&str, &str)> for FileSpec {
    type Error = ProviderError;

    fn try_from((path, mode): (&str, &str)) -> Result<Self, Self::Error> {
        FileSpec::with_mode(PathBuf::from(path), mode)
    }
}

/// A provider over a memory-mapped region of a file.
///
/// The provider owns both the open handle and the mapping. Views are
/// zero-copy windows onto the mapping. The length is the region size at
/// open time; reopen to observe growth. The mapping is read-only, so the
/// provider is READABLE only and supports neither `append` nor `write_at`.
///
/// `FileBytes` also implements [`Read`] and [`Seek`] over the region using
/// an internal read offset.
///
/// # Example
///
/// ```no_run
/// use byteprovider::{ByteProvider, ChunkOptions, FileBytes};
///
/// let mut provider = FileBytes::open("data.bin")?;
/// for chunk in provider.iter_chunks(ChunkOptions::default())? {
///     let chunk = chunk?;
///     println!("chunk {} bytes @ {}", chunk.len(), chunk.offset());
/// }
/// # Ok::<(), byteprovider::ProviderError>(())
/// ```
#[derive(Debug)]
pub struct FileBytes {
    state: ProviderState,
    data: Storage,
    region_start: u64,
    file_size: u64,
    position: u64,
    _file: File,
}

impl FileBytes {
    /// Opens and maps the whole file.
    pub fn open(spec: impl Into<FileSpec>) -> Result<Self, ProviderError> {
        Self::open_region(spec, 0, None)
    }

    /// Opens the file and maps `len` bytes starting at `offset`
    /// (to the end of the file when `len` is `None`).
    pub fn open_region(
        spec: impl Into<FileSpec>,
        offset: u64,
        len: Option<u64>,
    ) -> Result<Self, ProviderError> {
        let file = spec.into().open()?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(ProviderError::UnsupportedSource {
                message: "file source must be a regular file",
            });
        }

        let file_size = metadata.len();
        let len = len.unwrap_or(file_size.saturating_sub(offset));
        let region = offset..offset.saturating_add(len);
        if region.end > file_size || offset > file_size {
            return Err(ProviderError::out_of_bounds(&region, file_size));
        }

        let data = if len == 0 {
            Storage::Shared(Bytes::new())
        } else {
            let region: Arc<Region> = Arc::new(map_region(&file, offset, len)?);
            Storage::Mapped(region)
        };

        let state = ProviderState::new(Kind::File, Flags::READABLE)?;
        debug!(file_size, offset, len, "file provider mapped");
        Ok(Self {
            state,
            data,
            region_start: offset,
            file_size,
            position: 0,
            _file: file,
        })
    }

    /// Returns the size of the file when it was opened.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Returns the file offset at which the mapped region starts.
    pub fn region_start(&self) -> u64 {
        self.region_start
    }

    /// Returns the internal read offset used by [`Read`] and [`Seek`].
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Unmaps the region and closes the handle.
    ///
    /// Views issued by this provider hold no reference to the mapping, so
    /// the memory is released here and those views are stale afterwards.
    pub fn close(self) {
        debug!(file_size = self.file_size, "file provider closed");
    }
}

#[allow(unsafe_code)]
fn map_region(file: &File, offset: u64, len: u64) -> Result<Mmap, ProviderError> {
    let len = usize::try_from(len).map_err(|_| ProviderError::UnsupportedSource {
        message: "file region does not fit in the address space",
    })?;
    // SAFETY: Memory-mapping is safe here because:
    // 1. The file handle is valid and stays owned by the provider for the
    //    lifetime of the mapping
    // 2. The mapping is read-only, so no aliased mutation happens through it
    // 3. Concurrent external truncation is a documented limitation of
    //    memory-mapped I/O, not something this crate can prevent
    let mmap = unsafe { MmapOptions::new().offset(offset).len(len).map(file)? };
    Ok(mmap)
}

impl ByteProvider for FileBytes {
    fn kind(&self) -> Kind {
        self.state.kind()
    }

    fn flags(&self) -> Flags {
        self.state.flags()
    }

    fn total_length(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn get(&self, range: Range<u64>) -> Result<ByteView, ProviderError> {
        let span = check_range(&range, self.data.len() as u64)?;
        Ok(self.state.issue(self.data.window(span), range.start))
    }

    fn iter_chunks(&mut self, options: ChunkOptions) -> Result<ChunkIter<'_>, ProviderError> {
        let len = self.data.len() as u64;
        let plan = options.resolve(DEFAULT_CHUNK_SIZE, Some(len))?;
        let stop = plan.stop.unwrap_or(len);
        let source = SliceChunks::new(self.data.clone(), plan.start, stop, plan.chunk_size);
        let guard = self.state.begin_iteration()?;
        Ok(ChunkIter::new(guard, ChunkSource::Slices(source)))
    }
}

impl Read for FileBytes {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.data.len() as u64;
        if self.position >= len {
            return Ok(0);
        }
        let data = self.data.as_slice();
        let start = self.position as usize;
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for FileBytes {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.data.len() as i128;
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::End(n) => len + n as i128,
            SeekFrom::Current(n) => self.position as i128 + n as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of mapped region",
            ));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}
