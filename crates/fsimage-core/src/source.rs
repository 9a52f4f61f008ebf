//! Random-access container backends.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use fsimage_error::{FsImageError, Result};
use fsimage_types::SectionDescriptor;

/// Read-only, random-access view of an fsimage container.
pub trait ImageSource {
    /// Total container size in bytes.
    fn size(&self) -> u64;

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// Fails with [`FsImageError::ShortRead`] if the container ends first.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;
}

/// Seekable local file.
#[derive(Debug)]
pub struct FileImage {
    file: File,
    size: u64,
    path: PathBuf,
}

impl FileImage {
    /// Open `path` read-only and record its size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| FsImageError::CannotOpen {
            path: path.clone(),
            source,
        })?;
        let size = file.metadata()?.len();
        Ok(Self { file, size, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileImage {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                let available = usize::try_from(self.size.saturating_sub(offset))
                    .unwrap_or(usize::MAX)
                    .min(buf.len());
                FsImageError::ShortRead {
                    offset,
                    expected: buf.len(),
                    actual: available,
                }
            } else {
                err.into()
            }
        })
    }
}

/// In-memory container, mainly for tests and already-loaded images.
#[derive(Debug, Clone, Default)]
pub struct MemoryImage {
    bytes: Vec<u8>,
}

impl MemoryImage {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for MemoryImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl ImageSource for MemoryImage {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let available = self.bytes.len().saturating_sub(start);
        if available < buf.len() {
            return Err(FsImageError::ShortRead {
                offset,
                expected: buf.len(),
                actual: available,
            });
        }
        buf.copy_from_slice(&self.bytes[start..start + buf.len()]);
        Ok(())
    }
}

/// Read the full byte range of `section`.
pub fn read_section<S: ImageSource + ?Sized>(
    source: &mut S,
    section: &SectionDescriptor,
) -> Result<Vec<u8>> {
    let size = source.size();
    if !section.fits_within(size) {
        return Err(out_of_bounds(section, size));
    }
    let len = usize::try_from(section.length).map_err(|_| out_of_bounds(section, size))?;
    let mut buf = vec![0_u8; len];
    source.read_exact_at(section.offset, &mut buf)?;
    Ok(buf)
}

pub(crate) fn out_of_bounds(section: &SectionDescriptor, size: u64) -> FsImageError {
    FsImageError::SectionOutOfBounds {
        name: section.name.clone(),
        offset: section.offset,
        length: section.length,
        size,
    }
}
