//! Core type definitions for fsimage decoding.
//!
//! Everything here is pure: byte-level codecs, the decoded record model, and
//! the bit-field and rendering rules that turn records into exported rows.
//! File access and section orchestration live in `fsimage-core`.

pub mod model;
pub mod namespace;
pub mod permission;
pub mod text;
pub mod time;
pub mod varint;
pub mod wire;

pub use model::{
    BlockInfo, COLUMNS, DirectoryAttrs, DirectoryEdge, FileAttrs, INODE_DIR_SECTION,
    INODE_SECTION, InodeId, InodeKind, InodeRecord, InodeType, ROOT_INODE_ID, ResolvedRow,
    STRING_TABLE_ALIAS, STRING_TABLE_SECTION, SectionDescriptor, SymlinkAttrs,
};
pub use namespace::{GROUP_TAG, StringNamespace, USER_TAG};
pub use permission::{PermissionWord, render_mode};
pub use text::{escape_control, name_to_text};
pub use time::{EPOCH_SENTINEL, format_epoch_millis};
pub use varint::{MAX_VARINT_LEN, VarintError, read_uvarint, uvarint_len, write_uvarint};
pub use wire::{Field, MessageReader, MessageWriter, WireValue};
