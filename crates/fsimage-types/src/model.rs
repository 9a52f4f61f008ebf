//! Decoded fsimage records and the exported row shape.

use serde::Serialize;

use crate::permission::PermissionWord;

/// Inode identifier.
pub type InodeId = u64;

/// Well-known id of the namespace root directory.
pub const ROOT_INODE_ID: InodeId = 16_385;

/// Section holding inode records.
pub const INODE_SECTION: &str = "INODE";
/// Section holding parent/children edges.
pub const INODE_DIR_SECTION: &str = "INODE_DIR";
/// Section holding the string pool.
pub const STRING_TABLE_SECTION: &str = "STRING_TABLE";
/// Alternate spelling of the string pool section written by some producers.
pub const STRING_TABLE_ALIAS: &str = "STRINGTABLE";

/// Named byte range within the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionDescriptor {
    pub name: String,
    pub offset: u64,
    pub length: u64,
}

impl SectionDescriptor {
    /// One past the last byte, or `None` on overflow.
    #[must_use]
    pub const fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }

    /// Whether the range lies entirely within a container of `size` bytes.
    #[must_use]
    pub fn fits_within(&self, size: u64) -> bool {
        self.end().is_some_and(|end| end <= size)
    }
}

/// Inode type discriminant as stored in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InodeType {
    File,
    Directory,
    Symlink,
}

impl InodeType {
    /// 1 is a file, 2 a directory, anything else a symlink.
    #[must_use]
    pub const fn from_discriminant(value: u64) -> Self {
        match value {
            1 => Self::File,
            2 => Self::Directory,
            _ => Self::Symlink,
        }
    }
}

/// One block of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockInfo {
    pub block_id: u64,
    pub generation_stamp: u64,
    pub num_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileAttrs {
    pub replication: u32,
    pub modification_time: u64,
    pub access_time: u64,
    pub preferred_block_size: u64,
    pub blocks: Vec<BlockInfo>,
    pub permission: PermissionWord,
}

impl FileAttrs {
    /// Sum of block lengths.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.blocks
            .iter()
            .fold(0_u64, |acc, block| acc.saturating_add(block.num_bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryAttrs {
    pub modification_time: u64,
    pub ns_quota: i64,
    pub ds_quota: i64,
    pub permission: PermissionWord,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymlinkAttrs {
    pub target: Vec<u8>,
    pub permission: PermissionWord,
    pub modification_time: u64,
    pub access_time: u64,
}

/// Type-specific part of an inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InodeKind {
    File(FileAttrs),
    Directory(DirectoryAttrs),
    Symlink(SymlinkAttrs),
}

impl InodeKind {
    #[must_use]
    pub const fn inode_type(&self) -> InodeType {
        match self {
            Self::File(_) => InodeType::File,
            Self::Directory(_) => InodeType::Directory,
            Self::Symlink(_) => InodeType::Symlink,
        }
    }
}

/// A decoded inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeRecord {
    pub id: InodeId,
    /// Raw name bytes; empty for the root.
    pub name: Vec<u8>,
    pub kind: InodeKind,
}

/// Children of one directory as listed by one directory-section record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryEdge {
    pub parent_id: InodeId,
    pub children_ids: Vec<InodeId>,
}

/// Output column names, in order.
pub const COLUMNS: [&str; 12] = [
    "Path",
    "Replication",
    "ModificationTime",
    "AccessTime",
    "PreferredBlockSize",
    "BlocksCount",
    "FileSize",
    "NSQUOTA",
    "DSQUOTA",
    "Permission",
    "UserName",
    "GroupName",
];

/// One exported namespace entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResolvedRow {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Replication")]
    pub replication: u32,
    #[serde(rename = "ModificationTime")]
    pub modification_time: String,
    #[serde(rename = "AccessTime")]
    pub access_time: String,
    #[serde(rename = "PreferredBlockSize")]
    pub preferred_block_size: u64,
    #[serde(rename = "BlocksCount")]
    pub blocks_count: u64,
    #[serde(rename = "FileSize")]
    pub file_size: u64,
    #[serde(rename = "NSQUOTA")]
    pub ns_quota: i64,
    #[serde(rename = "DSQUOTA")]
    pub ds_quota: i64,
    #[serde(rename = "Permission")]
    pub permission: String,
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "GroupName")]
    pub group_name: String,
}
