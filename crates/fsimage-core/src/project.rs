//! Projection of resolved inodes into exported rows.

use fsimage_types::{
    DirectoryAttrs, EPOCH_SENTINEL, FileAttrs, InodeKind, InodeRecord, PermissionWord,
    ResolvedRow, StringNamespace, escape_control, format_epoch_millis,
};

use crate::string_pool::StringPool;

/// Turns `(path, record)` pairs into [`ResolvedRow`]s, resolving owner and
/// group names through the string pool.
#[derive(Debug, Clone, Copy)]
pub struct RowProjector<'a> {
    strings: &'a StringPool,
}

impl<'a> RowProjector<'a> {
    #[must_use]
    pub const fn new(strings: &'a StringPool) -> Self {
        Self { strings }
    }

    /// Build the row for `record` at `path`. `path` is expected to be
    /// escaped already.
    #[must_use]
    pub fn project(&self, path: String, record: &InodeRecord) -> ResolvedRow {
        match &record.kind {
            InodeKind::File(attrs) => self.file_row(path, attrs),
            InodeKind::Directory(attrs) => self.directory_row(path, attrs),
            InodeKind::Symlink(_) => ResolvedRow {
                path,
                ..ResolvedRow::default()
            },
        }
    }

    fn file_row(&self, path: String, attrs: &FileAttrs) -> ResolvedRow {
        let (permission, user_name, group_name) = self.ownership(attrs.permission);
        ResolvedRow {
            path,
            replication: attrs.replication,
            modification_time: format_epoch_millis(attrs.modification_time),
            access_time: format_epoch_millis(attrs.access_time),
            preferred_block_size: attrs.preferred_block_size,
            blocks_count: attrs.blocks.len() as u64,
            file_size: attrs.total_bytes(),
            ns_quota: 0,
            ds_quota: 0,
            permission,
            user_name,
            group_name,
        }
    }

    fn directory_row(&self, path: String, attrs: &DirectoryAttrs) -> ResolvedRow {
        let (permission, user_name, group_name) = self.ownership(attrs.permission);
        ResolvedRow {
            path,
            replication: 0,
            modification_time: format_epoch_millis(attrs.modification_time),
            access_time: EPOCH_SENTINEL.to_owned(),
            preferred_block_size: 0,
            blocks_count: 0,
            file_size: 0,
            ns_quota: attrs.ns_quota,
            ds_quota: attrs.ds_quota,
            permission,
            user_name,
            group_name,
        }
    }

    /// `(mode string, user name, group name)` for a permission word.
    fn ownership(&self, word: PermissionWord) -> (String, String, String) {
        let user = self.strings.lookup(word.owner_id(), StringNamespace::User);
        let group = self.strings.lookup(word.group_id(), StringNamespace::Group);
        (
            word.render_mode(),
            escape_control(&user).into_owned(),
            escape_control(&group).into_owned(),
        )
    }
}
