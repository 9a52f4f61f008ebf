//! Unsigned LEB128 varints as used by protobuf and the fsimage framing.
//!
//! Each byte carries 7 payload bits, least-significant group first. The high
//! bit is a continuation flag. A `u64` needs at most 10 bytes and the 10th
//! byte may only contribute the single remaining bit.

use fsimage_error::FsImageError;

/// Longest legal encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Why a varint could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintError {
    /// The buffer ended while the continuation bit was still set.
    Truncated,
    /// More than ten bytes, or the value does not fit 64 bits.
    Overflow,
}

impl VarintError {
    /// Attach the absolute offset of the varint and convert to the crate error.
    #[must_use]
    pub const fn at(self, offset: usize) -> FsImageError {
        match self {
            Self::Truncated => FsImageError::TruncatedVarint { offset },
            Self::Overflow => FsImageError::VarintOverflow { offset },
        }
    }
}

/// Read a varint from the start of `buf`, returning `(value, bytes_consumed)`.
pub fn read_uvarint(buf: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut value: u64 = 0;
    for (i, &byte) in buf.iter().enumerate().take(MAX_VARINT_LEN) {
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(VarintError::Overflow);
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if buf.len() >= MAX_VARINT_LEN {
        Err(VarintError::Overflow)
    } else {
        Err(VarintError::Truncated)
    }
}

/// Number of bytes needed to encode `value`.
#[must_use]
pub const fn uvarint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Append the encoding of `value` to `out`, returning the number of bytes written.
#[allow(clippy::cast_possible_truncation)]
pub fn write_uvarint(out: &mut Vec<u8>, value: u64) -> usize {
    let mut v = value;
    let mut written = 0;
    loop {
        written += 1;
        if v < 0x80 {
            out.push(v as u8);
            return written;
        }
        out.push((v as u8 & 0x7F) | 0x80);
        v >>= 7;
    }
}
