//! `STRING_TABLE` section: id → text pool for names, users and groups.

use std::borrow::Cow;

use hashbrown::HashMap;

use fsimage_error::Result;
use fsimage_types::{MessageReader, STRING_TABLE_SECTION, StringNamespace};
use serde::Serialize;
use tracing::{debug, info};

use crate::scanner::{ScanStats, scan_records, split_header};

/// `StringTableSection` header fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StringTableHeader {
    pub num_entry: u32,
    pub mask_bits: u32,
}

impl StringTableHeader {
    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut header = Self::default();
        for field in MessageReader::new(bytes) {
            let field = field?;
            match field.number {
                1 => header.num_entry = field.value.as_u32("numEntry")?,
                2 => header.mask_bits = field.value.as_u32("maskBits")?,
                _ => {}
            }
        }
        Ok(header)
    }
}

/// Decoded string pool.
///
/// Ids are raw `u32` keys exactly as stored, tag bits included.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    entries: HashMap<u32, String>,
    header: StringTableHeader,
}

impl StringPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a whole `STRING_TABLE` section.
    pub fn decode(section: &[u8]) -> Result<(Self, ScanStats)> {
        let (header, body) = split_header(section)?;
        let base = section.len() - body.len();
        let mut pool = Self::new();

        match StringTableHeader::decode(header) {
            Ok(header) => pool.header = header,
            Err(err) => debug!(error = %err, "string table header not decodable"),
        }

        let stats = scan_records(STRING_TABLE_SECTION, body, base, |record| {
            let (id, text) = decode_entry(record)?;
            pool.insert(id, text);
            Ok(())
        })?;

        info!(
            section = STRING_TABLE_SECTION,
            entries = pool.len(),
            declared = pool.header.num_entry,
            mask_bits = pool.header.mask_bits,
            skipped = stats.skipped,
            "string table decoded"
        );
        Ok((pool, stats))
    }

    /// Insert an entry. A duplicate id replaces the earlier text.
    pub fn insert(&mut self, id: u32, text: String) {
        self.entries.insert(id, text);
    }

    /// Exact lookup by raw id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Resolve `id` within `namespace`.
    ///
    /// Tries the tagged id, then the bare id, and finally falls back to the
    /// decimal form of `id`. Never fails.
    #[must_use]
    pub fn lookup(&self, id: u32, namespace: StringNamespace) -> Cow<'_, str> {
        self.get(namespace.tagged(id))
            .or_else(|| self.get(id))
            .map_or_else(|| Cow::Owned(id.to_string()), Cow::Borrowed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn header(&self) -> StringTableHeader {
        self.header
    }
}

/// Decode one `StringTableSection.Entry` into `(id, text)`.
pub fn decode_entry(record: &[u8]) -> Result<(u32, String)> {
    let mut id = 0;
    let mut text = String::new();
    for field in MessageReader::new(record) {
        let field = field?;
        match field.number {
            1 => id = field.value.as_u32("id")?,
            2 => text = field.value.as_text_lossy("str")?,
            _ => {}
        }
    }
    Ok((id, text))
}
