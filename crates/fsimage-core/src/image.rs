//! Decode context: section table plus the three decoded mappings.

use std::path::Path;
use std::thread;

use fsimage_error::{FsImageError, Result};
use fsimage_types::{INODE_DIR_SECTION, INODE_SECTION, ResolvedRow, SectionDescriptor};
use serde::Serialize;
use tracing::{Dispatch, Span, debug_span, dispatcher, info, info_span, warn};

use crate::directory::Adjacency;
use crate::inode::{InodeMap, InodeSectionHeader};
use crate::project::RowProjector;
use crate::scanner::ScanStats;
use crate::source::{FileImage, ImageSource, read_section};
use crate::string_pool::{StringPool, StringTableHeader};
use crate::summary::SectionTable;
use crate::walk::NamespaceWalker;

/// Knobs for [`FsImage::open`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Decode the string, inode and directory sections on separate threads.
    pub parallel: bool,
}

impl DecodeOptions {
    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Scan counters per decoded section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    pub strings: ScanStats,
    pub inodes: ScanStats,
    pub directories: ScanStats,
}

/// Serializable overview of a decoded image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub container_size: u64,
    pub ondisk_version: u32,
    pub layout_version: u32,
    pub sections: Vec<SectionDescriptor>,
    pub string_table: Option<StringTableHeader>,
    pub inode_header: InodeSectionHeader,
    pub strings: usize,
    pub inodes: usize,
    pub directories: usize,
    pub edges: usize,
    pub stats: DecodeStats,
}

/// A fully decoded fsimage, ready to be walked.
///
/// The mappings are immutable once `open` returns; walks and projections only
/// borrow them, so any number of row iterators can run over one image.
#[derive(Debug)]
pub struct FsImage {
    container_size: u64,
    table: SectionTable,
    strings: StringPool,
    inodes: InodeMap,
    adjacency: Adjacency,
    stats: DecodeStats,
}

struct SectionBytes {
    strings: Option<Vec<u8>>,
    inodes: Vec<u8>,
    directories: Vec<u8>,
}

type Decoded = (
    (StringPool, ScanStats),
    (InodeMap, ScanStats),
    (Adjacency, ScanStats),
);

impl FsImage {
    /// Decode the container behind `source`.
    ///
    /// Any structural problem fails the whole open. Individual undecodable
    /// records are logged and skipped.
    pub fn open<S: ImageSource + ?Sized>(source: &mut S, options: DecodeOptions) -> Result<Self> {
        let container_size = source.size();
        let span = info_span!("fsimage_open", container_size, parallel = options.parallel);
        let _guard = span.enter();

        let table = SectionTable::read(source)?;
        let inode_section = table.require(INODE_SECTION)?;
        let dir_section = table.require(INODE_DIR_SECTION)?;
        let string_section = table.string_table();
        if string_section.is_none() {
            warn!("no string table section; owner and group names render as ids");
        }

        let bytes = SectionBytes {
            strings: string_section
                .map(|section| read_section(source, section))
                .transpose()?,
            inodes: read_section(source, inode_section)?,
            directories: read_section(source, dir_section)?,
        };

        let ((strings, string_stats), (inodes, inode_stats), (adjacency, dir_stats)) =
            if options.parallel {
                decode_parallel(&bytes)?
            } else {
                decode_sequential(&bytes)?
            };

        let stats = DecodeStats {
            strings: string_stats,
            inodes: inode_stats,
            directories: dir_stats,
        };
        info!(
            container_size,
            sections = table.sections().len(),
            strings = strings.len(),
            inodes = inodes.len(),
            parents = adjacency.parent_count(),
            skipped = stats.strings.skipped + stats.inodes.skipped + stats.directories.skipped,
            "fsimage decoded"
        );

        Ok(Self {
            container_size,
            table,
            strings,
            inodes,
            adjacency,
            stats,
        })
    }

    /// Open and decode a local file.
    pub fn open_path(path: impl AsRef<Path>, options: DecodeOptions) -> Result<Self> {
        let mut file = FileImage::open(path)?;
        Self::open(&mut file, options)
    }

    /// Inodes with their paths, root first, depth-first pre-order.
    #[must_use]
    pub fn walk(&self) -> NamespaceWalker<'_> {
        NamespaceWalker::new(&self.inodes, &self.adjacency)
    }

    /// Exported rows in walk order.
    pub fn rows(&self) -> impl Iterator<Item = ResolvedRow> + '_ {
        let projector = RowProjector::new(&self.strings);
        self.walk()
            .map(move |resolved| projector.project(resolved.path, resolved.record))
    }

    #[must_use]
    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            container_size: self.container_size,
            ondisk_version: self.table.ondisk_version(),
            layout_version: self.table.layout_version(),
            sections: self.table.sections().to_vec(),
            string_table: self.table.string_table().map(|_| self.strings.header()),
            inode_header: self.inodes.header(),
            strings: self.strings.len(),
            inodes: self.inodes.len(),
            directories: self.adjacency.parent_count(),
            edges: self.adjacency.edge_count(),
            stats: self.stats,
        }
    }

    #[must_use]
    pub const fn section_table(&self) -> &SectionTable {
        &self.table
    }

    #[must_use]
    pub const fn strings(&self) -> &StringPool {
        &self.strings
    }

    #[must_use]
    pub const fn inodes(&self) -> &InodeMap {
        &self.inodes
    }

    #[must_use]
    pub const fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    #[must_use]
    pub const fn stats(&self) -> DecodeStats {
        self.stats
    }
}

fn decode_strings(bytes: Option<&[u8]>) -> Result<(StringPool, ScanStats)> {
    let _span = debug_span!("decode_section", section = "STRING_TABLE").entered();
    bytes.map_or_else(|| Ok((StringPool::new(), ScanStats::default())), StringPool::decode)
}

fn decode_inodes(bytes: &[u8]) -> Result<(InodeMap, ScanStats)> {
    let _span = debug_span!("decode_section", section = INODE_SECTION).entered();
    InodeMap::decode(bytes)
}

fn decode_directories(bytes: &[u8]) -> Result<(Adjacency, ScanStats)> {
    let _span = debug_span!("decode_section", section = INODE_DIR_SECTION).entered();
    Adjacency::decode(bytes)
}

fn decode_sequential(bytes: &SectionBytes) -> Result<Decoded> {
    Ok((
        decode_strings(bytes.strings.as_deref())?,
        decode_inodes(&bytes.inodes)?,
        decode_directories(&bytes.directories)?,
    ))
}

/// Each section decodes into its own map on its own thread; the maps are
/// joined before anything reads them. Worker threads log through the
/// caller's dispatcher, inside the caller's span.
fn decode_parallel(bytes: &SectionBytes) -> Result<Decoded> {
    let dispatch = dispatcher::get_default(Dispatch::clone);
    let parent = Span::current();
    thread::scope(|scope| -> Result<Decoded> {
        let strings = scope.spawn(|| {
            dispatcher::with_default(&dispatch, || {
                parent.in_scope(|| decode_strings(bytes.strings.as_deref()))
            })
        });
        let inodes = scope.spawn(|| {
            dispatcher::with_default(&dispatch, || {
                parent.in_scope(|| decode_inodes(&bytes.inodes))
            })
        });
        let directories = decode_directories(&bytes.directories);

        let strings = strings
            .join()
            .map_err(|_| FsImageError::internal("string table decoder panicked"))?;
        let inodes = inodes
            .join()
            .map_err(|_| FsImageError::internal("inode decoder panicked"))?;
        Ok((strings?, inodes?, directories?))
    })
}
