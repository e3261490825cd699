//! Codec errors and non-fatal diagnostics.
//!
//! Fatal problems (bad magic, size mismatches, oversized fields) abort the
//! current codec call with an [`Error`]. Everything else is reported as a
//! [`Diagnostic`]: the codec keeps going, logs a warning and hands the
//! diagnostic back to the caller in its report.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cpio::EntryKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Format error: {0}")]
    Format(String),
    #[error("MTK header declares {declared} payload bytes but {actual} follow the header")]
    SizeMismatch { declared: u32, actual: u64 },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Malformed manifest line {line}: {reason}")]
    Manifest { line: usize, reason: String },
    #[error("Destination {0:?} already exists, please remove it first")]
    DestinationExists(PathBuf),
    #[error("I/O error")]
    Io(#[from] io::Error),
    #[error("File I/O error: {0:?}")]
    File(PathBuf, #[source] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Map a short read into a format error naming what was being read.
    pub(crate) fn truncated(what: &str) -> impl FnOnce(io::Error) -> Self + '_ {
        move |e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Self::Format(format!("truncated {what}"))
            } else {
                Self::Io(e)
            }
        }
    }
}

/// Something the codec noticed but did not stop for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Device, pipe or socket entry: content consumed, entry dropped.
    UnsupportedEntryKind { name: String, kind: Option<EntryKind> },
    /// Manifest file entry whose source no longer exists.
    MissingSourceFile { name: String, path: PathBuf },
    /// Later entry with an already-seen name was dropped.
    NameCollision { name: String },
    /// Entry whose path would resolve through a symlink was dropped.
    UnsafePath { name: String },
    /// Address does not sit at the usual offset from `base`.
    AddressConvention {
        field: &'static str,
        expected: u32,
        actual: u32,
    },
}

impl Diagnostic {
    /// Log the diagnostic at warning level and hand it back.
    pub(crate) fn emit(self) -> Self {
        log::warn!("{self}");
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedEntryKind { name, kind: Some(kind) } => {
                write!(f, "{} entry {name:?} is not implemented, skipped", kind.tag())
            }
            Self::UnsupportedEntryKind { name, kind: None } => {
                write!(f, "entry {name:?} has an unknown file type, skipped")
            }
            Self::MissingSourceFile { name, path } => {
                write!(f, "source {} for {name:?} not found, skipped", path.display())
            }
            Self::NameCollision { name } => write!(f, "ignoring duplicate entry {name:?}"),
            Self::UnsafePath { name } => {
                write!(f, "entry {name:?} would be written through a symlink, skipped")
            }
            Self::AddressConvention {
                field,
                expected,
                actual,
            } => write!(
                f,
                "nonstandard {field}: 0x{actual:x} (expected 0x{expected:x})"
            ),
        }
    }
}
