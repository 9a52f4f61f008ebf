//! Snapshot decoder and namespace reconstructor for HDFS fsimage files.
//!
//! Decoding runs trailer → section table → {string pool, inodes, directory
//! graph} → path walk → row projection. [`FsImage`] owns the decoded state.

pub mod directory;
pub mod image;
pub mod inode;
pub mod project;
pub mod scanner;
pub mod source;
pub mod string_pool;
pub mod summary;
pub mod walk;

pub use directory::{Adjacency, decode_dir_entry};
pub use image::{DecodeOptions, DecodeStats, FsImage, ImageSummary};
pub use inode::{InodeMap, InodeSectionHeader, decode_inode};
pub use project::RowProjector;
pub use scanner::{RecordScanner, ScanStats, scan_records, split_header};
pub use source::{FileImage, ImageSource, MemoryImage, read_section};
pub use string_pool::{StringPool, StringTableHeader, decode_entry};
pub use summary::{SectionTable, TRAILER_LEN, read_trailer};
pub use walk::{NamespaceWalker, ResolvedInode, child_path};
