//! Minimal protobuf wire-format reader.
//!
//! fsimage records are protobuf messages. Only the wire layer is needed to
//! pull the handful of fields the exporter projects: tags, varints, fixed
//! 32/64-bit scalars and length-delimited payloads. Unknown fields are
//! skipped. Group wire types (3, 4) never appear in fsimage and are rejected.

use fsimage_error::{FsImageError, Result};

use crate::varint::read_uvarint;

/// Largest field number protobuf allows (`2^29 - 1`).
pub const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

/// One decoded field value, borrowing length-delimited payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireValue<'a> {
    /// Wire type 0.
    Varint(u64),
    /// Wire type 1 (little-endian).
    Fixed64(u64),
    /// Wire type 2.
    LengthDelimited(&'a [u8]),
    /// Wire type 5 (little-endian).
    Fixed32(u32),
}

/// A field number paired with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub number: u32,
    pub value: WireValue<'a>,
}

impl WireValue<'_> {
    /// Integer value for `uint64`, `int64` and `fixed64` fields.
    pub fn as_u64(&self, field: &str) -> Result<u64> {
        match *self {
            Self::Varint(v) | Self::Fixed64(v) => Ok(v),
            Self::Fixed32(v) => Ok(u64::from(v)),
            Self::LengthDelimited(_) => Err(unexpected(field, "integer", "bytes")),
        }
    }

    /// Integer value for `uint32` fields (protobuf truncates to 32 bits).
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_u32(&self, field: &str) -> Result<u32> {
        self.as_u64(field).map(|v| v as u32)
    }

    /// Two's-complement reinterpretation for `int64` fields stored as varints.
    #[allow(clippy::cast_possible_wrap)]
    pub fn as_i64(&self, field: &str) -> Result<i64> {
        self.as_u64(field).map(|v| v as i64)
    }

    /// Payload of a `bytes`, `string` or embedded message field.
    pub fn as_bytes(&self, field: &str) -> Result<&[u8]> {
        match *self {
            Self::LengthDelimited(bytes) => Ok(bytes),
            Self::Varint(_) => Err(unexpected(field, "bytes", "varint")),
            Self::Fixed64(_) => Err(unexpected(field, "bytes", "fixed64")),
            Self::Fixed32(_) => Err(unexpected(field, "bytes", "fixed32")),
        }
    }

    /// `string` payload, replacing invalid UTF-8 sequences.
    pub fn as_text_lossy(&self, field: &str) -> Result<String> {
        self.as_bytes(field)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Append a `repeated uint64` value, accepting packed and unpacked encodings.
    pub fn extend_u64s(&self, field: &str, out: &mut Vec<u64>) -> Result<()> {
        match *self {
            Self::LengthDelimited(mut packed) => {
                while !packed.is_empty() {
                    let (value, width) = read_uvarint(packed).map_err(|_| {
                        FsImageError::malformed(format!("{field}: bad packed varint"))
                    })?;
                    out.push(value);
                    packed = &packed[width..];
                }
                Ok(())
            }
            _ => {
                out.push(self.as_u64(field)?);
                Ok(())
            }
        }
    }
}

fn unexpected(field: &str, wanted: &str, found: &str) -> FsImageError {
    FsImageError::malformed(format!("{field}: expected {wanted}, found {found}"))
}

/// Iterator over the fields of one serialized message.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct MessageReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> MessageReader<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_varint(&mut self, what: &str) -> Result<u64> {
        let (value, width) = read_uvarint(&self.buf[self.pos..]).map_err(|err| {
            FsImageError::malformed(format!("{what} at byte {}: {err:?}", self.pos))
        })?;
        self.pos += width;
        Ok(value)
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                FsImageError::malformed(format!(
                    "{what} at byte {} needs {len} bytes, {} left",
                    self.pos,
                    self.buf.len() - self.pos
                ))
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_field(&mut self) -> Result<Field<'a>> {
        let key = self.read_varint("tag")?;
        let number = key >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(FsImageError::malformed(format!(
                "invalid field number {number}"
            )));
        }
        let number = u32::try_from(number)
            .map_err(|_| FsImageError::internal("field number exceeds u32"))?;

        let value = match key & 0x7 {
            0 => WireValue::Varint(self.read_varint("varint field")?),
            1 => {
                let bytes = self.take(8, "fixed64 field")?;
                let mut raw = [0_u8; 8];
                raw.copy_from_slice(bytes);
                WireValue::Fixed64(u64::from_le_bytes(raw))
            }
            2 => {
                let len = self.read_varint("length prefix")?;
                let len = usize::try_from(len).map_err(|_| {
                    FsImageError::malformed(format!("length {len} does not fit in memory"))
                })?;
                WireValue::LengthDelimited(self.take(len, "length-delimited field")?)
            }
            5 => {
                let bytes = self.take(4, "fixed32 field")?;
                let mut raw = [0_u8; 4];
                raw.copy_from_slice(bytes);
                WireValue::Fixed32(u32::from_le_bytes(raw))
            }
            other => {
                return Err(FsImageError::malformed(format!(
                    "unsupported wire type {other} for field {number}"
                )));
            }
        };
        Ok(Field { number, value })
    }
}

impl<'a> Iterator for MessageReader<'a> {
    type Item = Result<Field<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }
        let field = self.read_field();
        if field.is_err() {
            self.pos = self.buf.len();
        }
        Some(field)
    }
}

/// Minimal protobuf wire-format writer, the inverse of [`MessageReader`].
///
/// Used to build synthetic images for tests and fixtures.
#[derive(Debug, Clone, Default)]
pub struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn key(&mut self, number: u32, wire_type: u8) {
        crate::varint::write_uvarint(&mut self.buf, (u64::from(number) << 3) | u64::from(wire_type));
    }

    pub fn varint(&mut self, number: u32, value: u64) -> &mut Self {
        self.key(number, 0);
        crate::varint::write_uvarint(&mut self.buf, value);
        self
    }

    pub fn fixed64(&mut self, number: u32, value: u64) -> &mut Self {
        self.key(number, 1);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, number: u32, value: &[u8]) -> &mut Self {
        self.key(number, 2);
        crate::varint::write_uvarint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    pub fn packed_varints(&mut self, number: u32, values: &[u64]) -> &mut Self {
        let mut packed = Vec::new();
        for &value in values {
            crate::varint::write_uvarint(&mut packed, value);
        }
        self.bytes(number, &packed)
    }

    #[must_use]
    pub fn finish(&self) -> Vec<u8> {
        self.buf.clone()
    }
}
