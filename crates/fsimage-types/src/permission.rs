//! Permission word bit-field contract.
//!
//! HDFS packs ownership and mode into one 64-bit value:
//!
//! | Bits    | Width | Field                      |
//! |---------|-------|----------------------------|
//! | 40..64  | 24    | owner id (user string id)  |
//! | 16..40  | 24    | group id (group string id) |
//! | 0..16   | 16    | POSIX mode bits            |
//!
//! Bit positions are fixed regardless of how the word was serialized.

/// Shift of the owner id field.
pub const OWNER_SHIFT: u32 = 40;
/// Shift of the group id field.
pub const GROUP_SHIFT: u32 = 16;
/// Mask of a 24-bit id field after shifting.
pub const ID_MASK: u64 = 0x00FF_FFFF;
/// Mask of the mode field.
pub const MODE_MASK: u64 = 0xFFFF;
/// Sticky bit within the mode field.
pub const STICKY_BIT: u16 = 0o1000;

const READ: u16 = 4;
const WRITE: u16 = 2;
const EXECUTE: u16 = 1;

/// Packed `[owner:24][group:24][mode:16]` permission word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PermissionWord(u64);

impl PermissionWord {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Pack the three fields; ids wider than 24 bits are masked.
    #[must_use]
    pub const fn from_parts(owner_id: u32, group_id: u32, mode: u16) -> Self {
        Self(
            ((owner_id as u64 & ID_MASK) << OWNER_SHIFT)
                | ((group_id as u64 & ID_MASK) << GROUP_SHIFT)
                | mode as u64,
        )
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn owner_id(self) -> u32 {
        ((self.0 >> OWNER_SHIFT) & ID_MASK) as u32
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn group_id(self) -> u32 {
        ((self.0 >> GROUP_SHIFT) & ID_MASK) as u32
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn mode(self) -> u16 {
        (self.0 & MODE_MASK) as u16
    }

    /// `rwxrwxrwx`-style rendering of the mode field.
    #[must_use]
    pub fn render_mode(self) -> String {
        render_mode(self.mode())
    }
}

/// Render the nine permission characters of `mode`.
///
/// Each class (owner, group, other) is tested independently against
/// read/write/execute. The sticky bit replaces the final character with `t`
/// when other-execute is set and `T` when it is not. File-type bits above the
/// sticky bit are ignored.
#[must_use]
pub fn render_mode(mode: u16) -> String {
    let sticky = mode & STICKY_BIT != 0;
    let mut out = String::with_capacity(9);
    for shift in [6_u16, 3, 0] {
        let class = (mode >> shift) & 0o7;
        out.push(if class & READ != 0 { 'r' } else { '-' });
        out.push(if class & WRITE != 0 { 'w' } else { '-' });
        let exec = class & EXECUTE != 0;
        out.push(match (shift, sticky, exec) {
            (0, true, true) => 't',
            (0, true, false) => 'T',
            (_, _, true) => 'x',
            (_, _, false) => '-',
        });
    }
    out
}
