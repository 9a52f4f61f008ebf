//! Synthetic fsimage container builder.
//!
//! Produces byte-exact containers in the on-disk layout the decoder reads:
//! a magic prefix, the section payloads, the `FileSummary` block and the
//! big-endian summary length. Every knob needed to build malformed or
//! unusual images (aliased section names, codecs, raw records, dropped
//! sections) is exposed so tests can target one failure at a time.

use std::io::{self, Write};

use fsimage_types::{
    BlockInfo, DirectoryAttrs, FileAttrs, GROUP_TAG, INODE_DIR_SECTION, INODE_SECTION, InodeId,
    InodeKind, InodeRecord, MessageWriter, PermissionWord, ROOT_INODE_ID, STRING_TABLE_SECTION,
    SymlinkAttrs, USER_TAG, write_uvarint,
};
use tempfile::NamedTempFile;

/// Magic bytes at the start of every fsimage.
pub const MAGIC: &[u8; 8] = b"HDFSIMG1";
/// `ondiskVersion` written into the summary.
pub const ONDISK_VERSION: u64 = 1;
/// `layoutVersion` written into the summary (`-66` as stored).
pub const LAYOUT_VERSION: u64 = 0xFFFF_FFBE;
/// Timestamp used by the convenience constructors.
pub const DEFAULT_MTIME: u64 = 1_700_000_000_000;
/// Preferred block size used by [`ImageBuilder::file`].
pub const DEFAULT_BLOCK_SIZE: u64 = 134_217_728;

/// Incrementally describes a namespace and encodes it as a container.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    strings: Vec<(u32, String)>,
    next_string_id: u32,
    inodes: Vec<Vec<u8>>,
    last_inode_id: InodeId,
    dir_entries: Vec<Vec<u8>>,
    string_section_name: String,
    codec: Option<String>,
    omitted: Vec<String>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            next_string_id: 1,
            inodes: Vec::new(),
            last_inode_id: ROOT_INODE_ID,
            dir_entries: Vec::new(),
            string_section_name: STRING_TABLE_SECTION.to_owned(),
            codec: None,
            omitted: Vec::new(),
        }
    }

    /// Register a user name and return its untagged id.
    pub fn user(&mut self, name: &str) -> u32 {
        let id = self.allocate_string_id();
        self.strings.push((USER_TAG | id, name.to_owned()));
        id
    }

    /// Register a group name and return its untagged id.
    pub fn group(&mut self, name: &str) -> u32 {
        let id = self.allocate_string_id();
        self.strings.push((GROUP_TAG | id, name.to_owned()));
        id
    }

    /// Insert a string pool entry under an exact raw id.
    pub fn string(&mut self, raw_id: u32, text: &str) -> &mut Self {
        self.strings.push((raw_id, text.to_owned()));
        self
    }

    fn allocate_string_id(&mut self) -> u32 {
        let id = self.next_string_id;
        self.next_string_id += 1;
        id
    }

    /// Add any inode record.
    pub fn inode(&mut self, record: &InodeRecord) -> &mut Self {
        self.last_inode_id = self.last_inode_id.max(record.id);
        self.inodes.push(encode_inode(record));
        self
    }

    /// Add pre-encoded `INode` bytes, valid or not.
    pub fn raw_inode(&mut self, bytes: Vec<u8>) -> &mut Self {
        self.inodes.push(bytes);
        self
    }

    /// Root directory with unlimited quotas.
    pub fn root(&mut self, owner: u32, group: u32, mode: u16) -> &mut Self {
        self.inode(&InodeRecord {
            id: ROOT_INODE_ID,
            name: Vec::new(),
            kind: InodeKind::Directory(DirectoryAttrs {
                modification_time: DEFAULT_MTIME,
                ns_quota: i64::MAX,
                ds_quota: -1,
                permission: PermissionWord::from_parts(owner, group, mode),
            }),
        })
    }

    /// Directory without quotas.
    pub fn directory(
        &mut self,
        id: InodeId,
        name: impl AsRef<[u8]>,
        owner: u32,
        group: u32,
        mode: u16,
    ) -> &mut Self {
        self.inode(&InodeRecord {
            id,
            name: name.as_ref().to_vec(),
            kind: InodeKind::Directory(DirectoryAttrs {
                modification_time: DEFAULT_MTIME,
                ns_quota: -1,
                ds_quota: -1,
                permission: PermissionWord::from_parts(owner, group, mode),
            }),
        })
    }

    /// Replicated file with one block per entry of `block_lengths`.
    pub fn file(
        &mut self,
        id: InodeId,
        name: impl AsRef<[u8]>,
        owner: u32,
        group: u32,
        mode: u16,
        block_lengths: &[u64],
    ) -> &mut Self {
        let blocks = block_lengths
            .iter()
            .zip(1_073_741_825_u64..)
            .map(|(&num_bytes, block_id)| BlockInfo {
                block_id,
                generation_stamp: 1_001,
                num_bytes,
            })
            .collect();
        self.inode(&InodeRecord {
            id,
            name: name.as_ref().to_vec(),
            kind: InodeKind::File(FileAttrs {
                replication: 3,
                modification_time: DEFAULT_MTIME,
                access_time: DEFAULT_MTIME,
                preferred_block_size: DEFAULT_BLOCK_SIZE,
                blocks,
                permission: PermissionWord::from_parts(owner, group, mode),
            }),
        })
    }

    pub fn symlink(&mut self, id: InodeId, name: impl AsRef<[u8]>, target: &str) -> &mut Self {
        self.inode(&InodeRecord {
            id,
            name: name.as_ref().to_vec(),
            kind: InodeKind::Symlink(SymlinkAttrs {
                target: target.as_bytes().to_vec(),
                permission: PermissionWord::from_parts(0, 0, 0o777),
                modification_time: DEFAULT_MTIME,
                access_time: DEFAULT_MTIME,
            }),
        })
    }

    /// Add one `DirEntry` with packed children.
    pub fn children(&mut self, parent: InodeId, children: &[InodeId]) -> &mut Self {
        self.dir_entries.push(
            MessageWriter::new()
                .varint(1, parent)
                .packed_varints(2, children)
                .finish(),
        );
        self
    }

    /// Add pre-encoded `DirEntry` bytes.
    pub fn raw_dir_entry(&mut self, bytes: Vec<u8>) -> &mut Self {
        self.dir_entries.push(bytes);
        self
    }

    /// Name the string pool section `name` instead of `STRING_TABLE`.
    pub fn string_table_name(&mut self, name: &str) -> &mut Self {
        name.clone_into(&mut self.string_section_name);
        self
    }

    /// Record a compression codec in the summary.
    pub fn codec(&mut self, codec: &str) -> &mut Self {
        self.codec = Some(codec.to_owned());
        self
    }

    /// Leave section `name` out of the container entirely.
    pub fn omit_section(&mut self, name: &str) -> &mut Self {
        self.omitted.push(name.to_owned());
        self
    }

    /// Encode the container.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        let mut sections = Vec::new();

        let payloads = [
            ("NS_INFO".to_owned(), self.ns_info_section()),
            (self.string_section_name.clone(), self.string_section()),
            (INODE_SECTION.to_owned(), self.inode_section()),
            (INODE_DIR_SECTION.to_owned(), self.dir_section()),
        ];
        for (name, payload) in payloads {
            if self.omitted.iter().any(|omitted| *omitted == name) {
                continue;
            }
            let offset = out.len() as u64;
            out.extend_from_slice(&payload);
            sections.push(
                MessageWriter::new()
                    .bytes(1, name.as_bytes())
                    .varint(2, payload.len() as u64)
                    .varint(3, offset)
                    .finish(),
            );
        }

        let mut summary = MessageWriter::new();
        summary.varint(1, ONDISK_VERSION).varint(2, LAYOUT_VERSION);
        if let Some(codec) = &self.codec {
            summary.bytes(3, codec.as_bytes());
        }
        for section in &sections {
            summary.bytes(4, section);
        }
        let summary = delimited(&summary.finish());

        let summary_len = u32::try_from(summary.len()).unwrap_or(u32::MAX);
        out.extend_from_slice(&summary);
        out.extend_from_slice(&summary_len.to_be_bytes());
        out
    }

    /// Encode the container into a fresh temporary file.
    pub fn write_temp(&self) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&self.build())?;
        file.flush()?;
        Ok(file)
    }

    fn ns_info_section(&self) -> Vec<u8> {
        MessageWriter::new()
            .varint(1, 1_000)
            .varint(4, 1_001)
            .varint(6, self.last_inode_id)
            .finish()
    }

    fn string_section(&self) -> Vec<u8> {
        let header = MessageWriter::new()
            .varint(1, self.strings.len() as u64)
            .varint(2, 0)
            .finish();
        let mut out = delimited(&header);
        for (id, text) in &self.strings {
            let entry = MessageWriter::new()
                .varint(1, u64::from(*id))
                .bytes(2, text.as_bytes())
                .finish();
            out.extend(delimited(&entry));
        }
        out
    }

    fn inode_section(&self) -> Vec<u8> {
        let header = MessageWriter::new()
            .varint(1, self.last_inode_id)
            .varint(2, self.inodes.len() as u64)
            .finish();
        let mut out = delimited(&header);
        for record in &self.inodes {
            out.extend(delimited(record));
        }
        out
    }

    fn dir_section(&self) -> Vec<u8> {
        self.dir_entries
            .iter()
            .flat_map(|entry| delimited(entry))
            .collect()
    }
}

/// `varint(len) || bytes`.
#[must_use]
pub fn delimited(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    write_uvarint(&mut out, bytes.len() as u64);
    out.extend_from_slice(bytes);
    out
}

/// Encode an `INode` message.
#[must_use]
pub fn encode_inode(record: &InodeRecord) -> Vec<u8> {
    let mut msg = MessageWriter::new();
    let discriminant = match &record.kind {
        InodeKind::File(_) => 1,
        InodeKind::Directory(_) => 2,
        InodeKind::Symlink(_) => 3,
    };
    msg.varint(1, discriminant)
        .varint(2, record.id)
        .bytes(3, &record.name);
    match &record.kind {
        InodeKind::File(attrs) => msg.bytes(4, &encode_file(attrs)),
        InodeKind::Directory(attrs) => msg.bytes(5, &encode_directory(attrs)),
        InodeKind::Symlink(attrs) => msg.bytes(6, &encode_symlink(attrs)),
    };
    msg.finish()
}

fn encode_file(attrs: &FileAttrs) -> Vec<u8> {
    let mut msg = MessageWriter::new();
    msg.varint(1, u64::from(attrs.replication))
        .varint(2, attrs.modification_time)
        .varint(3, attrs.access_time)
        .varint(4, attrs.preferred_block_size)
        .fixed64(5, attrs.permission.raw());
    for block in &attrs.blocks {
        msg.bytes(
            6,
            &MessageWriter::new()
                .varint(1, block.block_id)
                .varint(2, block.generation_stamp)
                .varint(3, block.num_bytes)
                .finish(),
        );
    }
    msg.finish()
}

fn encode_directory(attrs: &DirectoryAttrs) -> Vec<u8> {
    MessageWriter::new()
        .varint(1, attrs.modification_time)
        .varint(2, attrs.ns_quota as u64)
        .varint(3, attrs.ds_quota as u64)
        .fixed64(4, attrs.permission.raw())
        .finish()
}

fn encode_symlink(attrs: &SymlinkAttrs) -> Vec<u8> {
    MessageWriter::new()
        .fixed64(1, attrs.permission.raw())
        .bytes(2, &attrs.target)
        .varint(3, attrs.modification_time)
        .varint(4, attrs.access_time)
        .finish()
}
