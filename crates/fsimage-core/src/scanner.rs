//! Length-prefixed record scanning shared by every section decoder.
//!
//! A window is a sequence of `varint(n) || n bytes` frames. Framing errors
//! (an unterminated varint or a short frame) are structural: nothing after
//! them can be trusted, so they end the scan with an error. Decode errors in
//! the frame payload are local to that record and are skipped.

use fsimage_error::{FsImageError, Result};
use fsimage_types::read_uvarint;
use serde::Serialize;
use tracing::warn;

/// Iterator over the record payloads of a window.
///
/// Offsets in errors are relative to the start of the section, which is
/// `base` bytes before the window. The iterator is fused after an error.
#[derive(Debug, Clone)]
pub struct RecordScanner<'a> {
    window: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> RecordScanner<'a> {
    #[must_use]
    pub const fn new(window: &'a [u8]) -> Self {
        Self::with_base(window, 0)
    }

    #[must_use]
    pub const fn with_base(window: &'a [u8], base: usize) -> Self {
        Self {
            window,
            pos: 0,
            base,
        }
    }

    /// Bytes of the window consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.pos
    }

    fn next_record(&mut self) -> Result<&'a [u8]> {
        let offset = self.base + self.pos;
        let rest = &self.window[self.pos..];
        let (len, width) = read_uvarint(rest).map_err(|err| err.at(offset))?;
        let available = rest.len() - width;
        let len = usize::try_from(len)
            .ok()
            .filter(|&len| len <= available)
            .ok_or(FsImageError::TruncatedRecord {
                offset,
                needed: len,
                available,
            })?;
        let start = self.pos + width;
        self.pos = start + len;
        Ok(&self.window[start..self.pos])
    }
}

impl<'a> Iterator for RecordScanner<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.window.len() {
            return None;
        }
        let record = self.next_record();
        if record.is_err() {
            self.pos = self.window.len();
        }
        Some(record)
    }
}

/// Per-section scan counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Frames found in the window.
    pub records: usize,
    /// Frames the handler accepted.
    pub decoded: usize,
    /// Frames the handler rejected.
    pub skipped: usize,
    /// Bytes covered by the window.
    pub bytes: usize,
}

/// Split the leading delimited header record off a section.
///
/// Returns `(header, body)`. An empty section has no header and is reported
/// as a truncated varint.
pub fn split_header(section: &[u8]) -> Result<(&[u8], &[u8])> {
    let mut scanner = RecordScanner::new(section);
    match scanner.next() {
        Some(header) => {
            let header = header?;
            Ok((header, &section[scanner.consumed()..]))
        }
        None => Err(FsImageError::TruncatedVarint { offset: 0 }),
    }
}

/// Run `handle` over every record of `window`.
///
/// A record-local handler error is logged as a [`FsImageError::RecordDecode`]
/// and the scan moves on to the next record. Framing errors and any other
/// handler error abort the scan.
pub fn scan_records<'a, F>(
    section: &str,
    window: &'a [u8],
    base: usize,
    mut handle: F,
) -> Result<ScanStats>
where
    F: FnMut(&'a [u8]) -> Result<()>,
{
    let mut stats = ScanStats {
        bytes: window.len(),
        ..ScanStats::default()
    };
    for (index, record) in RecordScanner::with_base(window, base).enumerate() {
        let record = record?;
        stats.records += 1;
        match handle(record) {
            Ok(()) => stats.decoded += 1,
            Err(err) if !err.is_record_local() => return Err(err),
            Err(err) => {
                stats.skipped += 1;
                let err = FsImageError::RecordDecode {
                    section: section.to_owned(),
                    index,
                    detail: err.to_string(),
                };
                warn!(
                    section,
                    record_index = index,
                    record_len = record.len(),
                    error = %err,
                    "skipping undecodable record"
                );
            }
        }
    }
    Ok(stats)
}
