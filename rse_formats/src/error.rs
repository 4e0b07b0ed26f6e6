use std::path::PathBuf;
use std::str::Utf8Error;

use thiserror::Error;

/// How many bytes at the failing offset are kept for diagnostics.
pub const ACTUAL_BYTES_LEN: usize = 16;

/// Why a sized string could not be turned into text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("sized string is not NUL terminated")]
    MissingTerminator,
    #[error("sized string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),
}

/// Failure while decoding a SOB/QOB byte stream.
///
/// Every variant records where the cursor was, which construct it was trying
/// to read, and up to [`ACTUAL_BYTES_LEN`] bytes found there. Once any of
/// these is returned the cursor position can no longer be trusted, so the
/// whole file decode is abandoned.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(
        "reading {expected} at offset {offset:#x}: needed {wanted} bytes but only {remaining} remain"
    )]
    Bounds {
        offset: usize,
        expected: &'static str,
        wanted: usize,
        remaining: usize,
        actual: Vec<u8>,
    },
    #[error("reading {expected} at offset {offset:#x}: {source}")]
    Text {
        offset: usize,
        expected: &'static str,
        source: TextError,
        actual: Vec<u8>,
    },
    #[error("reading {expected} at offset {offset:#x}: {detail}")]
    Format {
        offset: usize,
        expected: &'static str,
        detail: String,
        actual: Vec<u8>,
    },
}

impl DecodeError {
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::Bounds { offset, .. }
            | DecodeError::Text { offset, .. }
            | DecodeError::Format { offset, .. } => *offset,
        }
    }

    pub fn expected(&self) -> &'static str {
        match self {
            DecodeError::Bounds { expected, .. }
            | DecodeError::Text { expected, .. }
            | DecodeError::Format { expected, .. } => expected,
        }
    }

    pub fn actual(&self) -> &[u8] {
        match self {
            DecodeError::Bounds { actual, .. }
            | DecodeError::Text { actual, .. }
            | DecodeError::Format { actual, .. } => actual,
        }
    }
}

/// Misuse of the renderable assembler, or a decoded object whose indices do
/// not line up with its own tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("geometry object {name:?} does not carry SOB faces")]
    NotSob { name: String },
    #[error("{what} index {index} out of range for {len} entries")]
    IndexOutOfRange {
        what: &'static str,
        index: u32,
        len: usize,
    },
}

/// Failure while loading a model or side-car file from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} does not have a .sob or .qob extension", .path.display())]
    UnknownKind { path: PathBuf },
    #[error("decoding {}", .path.display())]
    Decode { path: PathBuf, source: DecodeError },
}
