use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for fsimage decoding and export.
///
/// Variants fall into three groups that drive how callers react:
/// structural errors abort the whole decode, record errors are reported and
/// skipped by the section scanners, and I/O or argument errors come from the
/// surrounding tooling.
#[derive(Error, Debug)]
pub enum FsImageError {
    // === I/O Errors ===
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image file could not be opened.
    #[error("unable to open fsimage '{path}': {source}")]
    CannotOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Short read (fewer bytes than expected).
    #[error("short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    // === Structural Errors ===
    /// Container is too small to hold the 4-byte summary length.
    #[error("fsimage truncated: {size} bytes is too small for the summary trailer")]
    TruncatedTrailer { size: u64 },

    /// Summary length points before the start of the container.
    #[error("fsimage summary of {summary_len} bytes does not fit in a {size}-byte container")]
    TruncatedSummary { summary_len: u64, size: u64 },

    /// A section descriptor addresses bytes outside the container.
    #[error("section {name} at offset {offset} with length {length} exceeds container size {size}")]
    SectionOutOfBounds {
        name: String,
        offset: u64,
        length: u64,
        size: u64,
    },

    /// A mandatory section is absent from the section table.
    #[error("missing mandatory section: {name}")]
    MissingSection { name: String },

    /// The image was written with a compression codec.
    #[error("compressed fsimage is not supported (codec {codec})")]
    UnsupportedCodec { codec: String },

    // === Record Errors ===
    /// A varint was expected but the window ended mid-encoding.
    #[error("truncated varint at offset {offset}")]
    TruncatedVarint { offset: usize },

    /// A varint ran past ten bytes or overflowed 64 bits.
    #[error("varint overflow at offset {offset}")]
    VarintOverflow { offset: usize },

    /// A length prefix claims more bytes than the window holds.
    #[error("truncated record at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedRecord {
        offset: usize,
        needed: u64,
        available: usize,
    },

    /// One record inside a section failed to decode.
    #[error("{section} record {index} could not be decoded: {detail}")]
    RecordDecode {
        section: String,
        index: usize,
        detail: String,
    },

    /// A protobuf message is malformed at the wire level.
    #[error("malformed message: {detail}")]
    Malformed { detail: String },

    // === Tooling Errors ===
    /// Invalid command-line or configuration value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error classes, also used as process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Successful result.
    Ok = 0,
    /// Generic error.
    Error = 1,
    /// Bad command-line usage.
    Usage = 2,
    /// Disk I/O error.
    IoErr = 3,
    /// Unable to open the image file.
    CantOpen = 4,
    /// Image structure is malformed.
    Corrupt = 5,
    /// A required section is missing.
    NotFound = 6,
    /// Image uses a feature this decoder does not handle.
    Unsupported = 7,
    /// Internal logic error.
    Internal = 8,
}

impl FsImageError {
    /// Map this error to its error class.
    #[allow(clippy::match_same_arms)]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io(_) | Self::ShortRead { .. } => ErrorCode::IoErr,
            Self::CannotOpen { .. } => ErrorCode::CantOpen,
            Self::TruncatedTrailer { .. }
            | Self::TruncatedSummary { .. }
            | Self::SectionOutOfBounds { .. }
            | Self::TruncatedVarint { .. }
            | Self::VarintOverflow { .. }
            | Self::TruncatedRecord { .. }
            | Self::Malformed { .. } => ErrorCode::Corrupt,
            Self::RecordDecode { .. } => ErrorCode::Error,
            Self::MissingSection { .. } => ErrorCode::NotFound,
            Self::UnsupportedCodec { .. } => ErrorCode::Unsupported,
            Self::InvalidArgument(_) => ErrorCode::Usage,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Whether this error invalidates the whole image.
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::TruncatedTrailer { .. }
                | Self::TruncatedSummary { .. }
                | Self::SectionOutOfBounds { .. }
                | Self::MissingSection { .. }
                | Self::UnsupportedCodec { .. }
                | Self::TruncatedVarint { .. }
                | Self::VarintOverflow { .. }
                | Self::TruncatedRecord { .. }
        )
    }

    /// Whether a section scanner may skip the failing record and continue.
    pub const fn is_record_local(&self) -> bool {
        matches!(self, Self::RecordDecode { .. } | Self::Malformed { .. })
    }

    /// Human-friendly suggestion for fixing this error.
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::CannotOpen { .. } => Some("Check the fsimage path and read permissions"),
            Self::TruncatedTrailer { .. } | Self::TruncatedSummary { .. } => {
                Some("The file is incomplete; copy the fsimage again from the NameNode")
            }
            Self::UnsupportedCodec { .. } => {
                Some("Re-save the namespace with dfs.image.compress=false")
            }
            Self::MissingSection { .. } => {
                Some("Make sure the file is a protobuf fsimage, not an edits log")
            }
            Self::InvalidArgument(_) => Some("Run with --help for usage"),
            _ => None,
        }
    }

    /// Get the process exit code for this error (for CLI use).
    pub const fn exit_code(&self) -> i32 {
        self.error_code() as i32
    }

    /// Create a wire-level malformed-message error.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }

    /// Create a missing-section error.
    pub fn missing_section(name: impl Into<String>) -> Self {
        Self::MissingSection { name: name.into() }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type alias using `FsImageError`.
pub type Result<T> = std::result::Result<T, FsImageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_missing_section() {
        let err = FsImageError::missing_section("INODE_DIR");
        assert_eq!(err.to_string(), "missing mandatory section: INODE_DIR");
    }

    #[test]
    fn error_display_truncated_record() {
        let err = FsImageError::TruncatedRecord {
            offset: 12,
            needed: 40,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "truncated record at offset 12: need 40 bytes, 3 available"
        );
    }

    #[test]
    fn error_display_record_decode() {
        let err = FsImageError::RecordDecode {
            section: "INODE".to_owned(),
            index: 7,
            detail: "bad wire type 6".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "INODE record 7 could not be decoded: bad wire type 6"
        );
    }

    #[test]
    fn error_code_mapping() {
        assert_eq!(
            FsImageError::TruncatedTrailer { size: 2 }.error_code(),
            ErrorCode::Corrupt
        );
        assert_eq!(
            FsImageError::missing_section("INODE").error_code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            FsImageError::UnsupportedCodec {
                codec: "gzip".to_owned()
            }
            .error_code(),
            ErrorCode::Unsupported
        );
        assert_eq!(
            FsImageError::invalid_argument("x").error_code(),
            ErrorCode::Usage
        );
        assert_eq!(FsImageError::internal("x").error_code(), ErrorCode::Internal);
    }

    #[test]
    fn structural_vs_record_local() {
        assert!(FsImageError::TruncatedTrailer { size: 0 }.is_structural());
        assert!(FsImageError::missing_section("INODE").is_structural());
        assert!(FsImageError::TruncatedVarint { offset: 0 }.is_structural());
        assert!(!FsImageError::malformed("x").is_structural());
        assert!(FsImageError::malformed("x").is_record_local());
        assert!(!FsImageError::TruncatedTrailer { size: 0 }.is_record_local());
    }

    #[test]
    fn suggestions() {
        assert!(FsImageError::TruncatedTrailer { size: 1 }
            .suggestion()
            .is_some());
        assert!(FsImageError::internal("bug").suggestion().is_none());
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FsImageError = io_err.into();
        assert!(matches!(err, FsImageError::Io(_)));
        assert_eq!(err.error_code(), ErrorCode::IoErr);
    }

    #[test]
    fn exit_code() {
        assert_eq!(FsImageError::invalid_argument("x").exit_code(), 2);
        assert_eq!(FsImageError::malformed("x").exit_code(), 5);
        assert_eq!(FsImageError::missing_section("INODE").exit_code(), 6);
        assert_eq!(ErrorCode::Ok as i32, 0);
    }
}
