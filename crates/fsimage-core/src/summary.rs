//! Trailer and section table.
//!
//! ```text
//! container := <section bytes>* <summary> <u32 big-endian summary length>
//! summary   := varint(len) FileSummary[len]
//! ```
//!
//! `FileSummary` fields: `ondiskVersion = 1`, `layoutVersion = 2`,
//! `codec = 3`, repeated `sections = 4` where each section is
//! `{name = 1, length = 2, offset = 3}`.

use hashbrown::HashMap;

use fsimage_error::{FsImageError, Result};
use fsimage_types::{
    MessageReader, STRING_TABLE_ALIAS, STRING_TABLE_SECTION, SectionDescriptor,
};
use tracing::debug;

use crate::scanner::split_header;
use crate::source::{ImageSource, out_of_bounds};

/// Size of the big-endian summary length at the end of the container.
pub const TRAILER_LEN: u64 = 4;

/// Read the summary length stored in the last four bytes.
pub fn read_trailer<S: ImageSource + ?Sized>(source: &mut S) -> Result<u32> {
    let size = source.size();
    if size < TRAILER_LEN {
        return Err(FsImageError::TruncatedTrailer { size });
    }
    let mut raw = [0_u8; 4];
    source.read_exact_at(size - TRAILER_LEN, &mut raw)?;
    Ok(u32::from_be_bytes(raw))
}

/// Decoded `FileSummary`: format versions plus the name-addressed sections.
#[derive(Debug, Clone, Default)]
pub struct SectionTable {
    ondisk_version: u32,
    layout_version: u32,
    codec: Option<String>,
    sections: Vec<SectionDescriptor>,
    by_name: HashMap<String, usize>,
}

impl SectionTable {
    /// Locate and decode the summary of `source`.
    pub fn read<S: ImageSource + ?Sized>(source: &mut S) -> Result<Self> {
        let size = source.size();
        let summary_len = u64::from(read_trailer(source)?);
        let start = size
            .checked_sub(TRAILER_LEN + summary_len)
            .ok_or(FsImageError::TruncatedSummary { summary_len, size })?;
        let len = usize::try_from(summary_len)
            .map_err(|_| FsImageError::TruncatedSummary { summary_len, size })?;
        let mut block = vec![0_u8; len];
        source.read_exact_at(start, &mut block)?;
        Self::decode(&block, size)
    }

    /// Decode a summary block for a container of `container_size` bytes.
    pub fn decode(block: &[u8], container_size: u64) -> Result<Self> {
        let (message, _) = split_header(block)?;
        let mut table = Self::default();

        for field in MessageReader::new(message) {
            let field = field?;
            match field.number {
                1 => table.ondisk_version = field.value.as_u32("ondiskVersion")?,
                2 => table.layout_version = field.value.as_u32("layoutVersion")?,
                3 => {
                    let codec = field.value.as_text_lossy("codec")?;
                    table.codec = (!codec.is_empty()).then_some(codec);
                }
                4 => {
                    let section = decode_section(field.value.as_bytes("sections")?)?;
                    table.push(section);
                }
                _ => {}
            }
        }

        if let Some(codec) = &table.codec {
            return Err(FsImageError::UnsupportedCodec {
                codec: codec.clone(),
            });
        }
        for section in &table.sections {
            if !section.fits_within(container_size) {
                return Err(out_of_bounds(section, container_size));
            }
            debug!(
                section = %section.name,
                offset = section.offset,
                length = section.length,
                "section table entry"
            );
        }
        Ok(table)
    }

    fn push(&mut self, section: SectionDescriptor) {
        self.by_name.insert(section.name.clone(), self.sections.len());
        self.sections.push(section);
    }

    /// Section by exact (case-sensitive) name. Later duplicates win.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SectionDescriptor> {
        self.by_name.get(name).map(|&idx| &self.sections[idx])
    }

    /// Section that must be present for the decode to proceed.
    pub fn require(&self, name: &str) -> Result<&SectionDescriptor> {
        self.get(name)
            .ok_or_else(|| FsImageError::missing_section(name))
    }

    /// String pool section under its primary name or its alias.
    #[must_use]
    pub fn string_table(&self) -> Option<&SectionDescriptor> {
        self.get(STRING_TABLE_SECTION)
            .or_else(|| self.get(STRING_TABLE_ALIAS))
    }

    /// Sections in on-disk summary order.
    #[must_use]
    pub fn sections(&self) -> &[SectionDescriptor] {
        &self.sections
    }

    #[must_use]
    pub const fn ondisk_version(&self) -> u32 {
        self.ondisk_version
    }

    #[must_use]
    pub const fn layout_version(&self) -> u32 {
        self.layout_version
    }
}

fn decode_section(bytes: &[u8]) -> Result<SectionDescriptor> {
    let mut section = SectionDescriptor {
        name: String::new(),
        offset: 0,
        length: 0,
    };
    for field in MessageReader::new(bytes) {
        let field = field?;
        match field.number {
            1 => section.name = field.value.as_text_lossy("section.name")?,
            2 => section.length = field.value.as_u64("section.length")?,
            3 => section.offset = field.value.as_u64("section.offset")?,
            _ => {}
        }
    }
    Ok(section)
}
