//! `INODE` section: every file, directory and symlink record.
//!
//! Message layouts (field numbers):
//!
//! | Message          | Fields                                                             |
//! |------------------|--------------------------------------------------------------------|
//! | section header   | `lastInodeId = 1`, `numInodes = 2`                                 |
//! | `INode`          | `type = 1`, `id = 2`, `name = 3`, `file = 4`, `directory = 5`, `symlink = 6` |
//! | `INodeFile`      | `replication = 1`, `modificationTime = 2`, `accessTime = 3`, `preferredBlockSize = 4`, `permission = 5`, `blocks = 6` |
//! | `BlockProto`     | `blockId = 1`, `genStamp = 2`, `numBytes = 3`                      |
//! | `INodeDirectory` | `modificationTime = 1`, `nsQuota = 2`, `dsQuota = 3`, `permission = 4` |
//! | `INodeSymlink`   | `permission = 1`, `target = 2`, `modificationTime = 3`, `accessTime = 4` |

use hashbrown::HashMap;

use fsimage_error::Result;
use fsimage_types::{
    BlockInfo, DirectoryAttrs, FileAttrs, INODE_SECTION, InodeId, InodeKind, InodeRecord,
    InodeType, MessageReader, PermissionWord, SymlinkAttrs,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::scanner::{ScanStats, scan_records, split_header};

/// `INodeSection` header fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InodeSectionHeader {
    pub last_inode_id: u64,
    pub num_inodes: u64,
}

impl InodeSectionHeader {
    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut header = Self::default();
        for field in MessageReader::new(bytes) {
            let field = field?;
            match field.number {
                1 => header.last_inode_id = field.value.as_u64("lastInodeId")?,
                2 => header.num_inodes = field.value.as_u64("numInodes")?,
                _ => {}
            }
        }
        Ok(header)
    }
}

/// id → inode record.
#[derive(Debug, Clone, Default)]
pub struct InodeMap {
    records: HashMap<InodeId, InodeRecord>,
    header: InodeSectionHeader,
}

impl InodeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a whole `INODE` section.
    pub fn decode(section: &[u8]) -> Result<(Self, ScanStats)> {
        let (header, body) = split_header(section)?;
        let base = section.len() - body.len();
        let mut map = Self::new();

        match InodeSectionHeader::decode(header) {
            Ok(header) => map.header = header,
            Err(err) => debug!(error = %err, "inode section header not decodable"),
        }

        let stats = scan_records(INODE_SECTION, body, base, |record| {
            map.insert(decode_inode(record)?);
            Ok(())
        })?;

        let declared = map.header.num_inodes;
        if declared != 0 && usize::try_from(declared).ok() != Some(stats.records) {
            warn!(
                section = INODE_SECTION,
                declared,
                found = stats.records,
                "inode count does not match section header"
            );
        }
        info!(
            section = INODE_SECTION,
            inodes = map.len(),
            last_inode_id = map.header.last_inode_id,
            skipped = stats.skipped,
            "inode section decoded"
        );
        Ok((map, stats))
    }

    /// Insert a record, replacing any earlier record with the same id.
    pub fn insert(&mut self, record: InodeRecord) {
        self.records.insert(record.id, record);
    }

    #[must_use]
    pub fn get(&self, id: InodeId) -> Option<&InodeRecord> {
        self.records.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: InodeId) -> bool {
        self.records.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &InodeRecord> {
        self.records.values()
    }

    #[must_use]
    pub const fn header(&self) -> InodeSectionHeader {
        self.header
    }
}

/// Decode one `INode` message.
///
/// A missing `type` field means `FILE`, the protobuf default. A missing
/// type-specific sub-message decodes as all-zero attributes.
pub fn decode_inode(record: &[u8]) -> Result<InodeRecord> {
    let mut discriminant = 1;
    let mut id = 0;
    let mut name = Vec::new();
    let mut file = None;
    let mut directory = None;
    let mut symlink = None;

    for field in MessageReader::new(record) {
        let field = field?;
        match field.number {
            1 => discriminant = field.value.as_u64("type")?,
            2 => id = field.value.as_u64("id")?,
            3 => name = field.value.as_bytes("name")?.to_vec(),
            4 => file = Some(decode_file(field.value.as_bytes("file")?)?),
            5 => directory = Some(decode_directory(field.value.as_bytes("directory")?)?),
            6 => symlink = Some(decode_symlink(field.value.as_bytes("symlink")?)?),
            _ => {}
        }
    }

    let kind = match InodeType::from_discriminant(discriminant) {
        InodeType::File => InodeKind::File(file.unwrap_or_default()),
        InodeType::Directory => InodeKind::Directory(directory.unwrap_or_default()),
        InodeType::Symlink => InodeKind::Symlink(symlink.unwrap_or_default()),
    };
    Ok(InodeRecord { id, name, kind })
}

fn decode_file(bytes: &[u8]) -> Result<FileAttrs> {
    let mut attrs = FileAttrs::default();
    for field in MessageReader::new(bytes) {
        let field = field?;
        match field.number {
            1 => attrs.replication = field.value.as_u32("file.replication")?,
            2 => attrs.modification_time = field.value.as_u64("file.modificationTime")?,
            3 => attrs.access_time = field.value.as_u64("file.accessTime")?,
            4 => attrs.preferred_block_size = field.value.as_u64("file.preferredBlockSize")?,
            5 => attrs.permission = PermissionWord::new(field.value.as_u64("file.permission")?),
            6 => attrs.blocks.push(decode_block(field.value.as_bytes("file.blocks")?)?),
            _ => {}
        }
    }
    Ok(attrs)
}

fn decode_block(bytes: &[u8]) -> Result<BlockInfo> {
    let mut block = BlockInfo::default();
    for field in MessageReader::new(bytes) {
        let field = field?;
        match field.number {
            1 => block.block_id = field.value.as_u64("block.blockId")?,
            2 => block.generation_stamp = field.value.as_u64("block.genStamp")?,
            3 => block.num_bytes = field.value.as_u64("block.numBytes")?,
            _ => {}
        }
    }
    Ok(block)
}

fn decode_directory(bytes: &[u8]) -> Result<DirectoryAttrs> {
    let mut attrs = DirectoryAttrs::default();
    for field in MessageReader::new(bytes) {
        let field = field?;
        match field.number {
            1 => attrs.modification_time = field.value.as_u64("directory.modificationTime")?,
            2 => attrs.ns_quota = field.value.as_i64("directory.nsQuota")?,
            3 => attrs.ds_quota = field.value.as_i64("directory.dsQuota")?,
            4 => {
                attrs.permission =
                    PermissionWord::new(field.value.as_u64("directory.permission")?);
            }
            _ => {}
        }
    }
    Ok(attrs)
}

fn decode_symlink(bytes: &[u8]) -> Result<SymlinkAttrs> {
    let mut attrs = SymlinkAttrs::default();
    for field in MessageReader::new(bytes) {
        let field = field?;
        match field.number {
            1 => attrs.permission = PermissionWord::new(field.value.as_u64("symlink.permission")?),
            2 => attrs.target = field.value.as_bytes("symlink.target")?.to_vec(),
            3 => attrs.modification_time = field.value.as_u64("symlink.modificationTime")?,
            4 => attrs.access_time = field.value.as_u64("symlink.accessTime")?,
            _ => {}
        }
    }
    Ok(attrs)
}
