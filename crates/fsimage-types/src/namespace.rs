//! String-pool id namespaces.
//!
//! The string table multiplexes three logical tables into one id space by
//! setting a tag bit above the index. The tag values are format-version
//! specific, so lookups also try the untagged id.

use serde::Serialize;

/// Tag bit marking an id in the user-name namespace.
pub const USER_TAG: u32 = 0x2000_0000;
/// Tag bit marking an id in the group-name namespace.
pub const GROUP_TAG: u32 = 0x4000_0000;

/// Which logical string table an id is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StringNamespace {
    /// Plain names, no tag.
    Generic,
    /// Owner names.
    User,
    /// Group names.
    Group,
}

impl StringNamespace {
    /// Tag bit for this namespace (zero for `Generic`).
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Self::Generic => 0,
            Self::User => USER_TAG,
            Self::Group => GROUP_TAG,
        }
    }

    /// `id` with this namespace's tag applied.
    #[must_use]
    pub const fn tagged(self, id: u32) -> u32 {
        id | self.tag()
    }
}
