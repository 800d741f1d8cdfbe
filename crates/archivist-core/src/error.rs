//! Error types for archive building operations.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// The layer of a writer that failed while being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseLayer {
    /// The zip central directory writer.
    ZipDirectory,
    /// The tar stream writer (end-of-archive blocks).
    TarStream,
    /// The gzip compressor wrapping the tar stream.
    Gzip,
    /// The underlying output file.
    File,
}

impl fmt::Display for CloseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ZipDirectory => "zip directory",
            Self::TarStream => "tar stream",
            Self::Gzip => "gzip stream",
            Self::File => "output file",
        };
        f.write_str(name)
    }
}

/// A single failure observed while closing a writer.
#[derive(Debug)]
pub struct CloseFailure {
    /// Layer that failed.
    pub layer: CloseLayer,
    /// Underlying error.
    pub source: std::io::Error,
}

impl fmt::Display for CloseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.layer, self.source)
    }
}

/// Errors that can occur while building an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Requested archive format is not one of `zip` or `tar.gz`.
    #[error("unsupported archive type {name:?}, only zip and tar.gz are supported")]
    UnsupportedFormat {
        /// Format name as supplied by the caller.
        name: String,
    },

    /// Output permission string is not a valid octal mode.
    #[error("invalid output file mode {value:?}: {reason}")]
    InvalidFileMode {
        /// Mode string as supplied by the caller.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Output archive file could not be created.
    #[error("cannot create archive {path}: {source}")]
    CreateOutput {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A path could not be turned into an absolute path.
    #[error("cannot resolve absolute path for {path}: {source}")]
    ResolvePath {
        /// The path that failed to resolve.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A path could not be inspected or a symlink could not be read.
    #[error("cannot evaluate symlink {path}: {source}")]
    Symlink {
        /// The inspected path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A source file or directory could not be read.
    #[error("cannot read source {path}: {source}")]
    ReadSource {
        /// Source path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be created or written in the archive stream.
    #[error("cannot write archive entry {name:?}: {source}")]
    WriteEntry {
        /// Destination entry name.
        name: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Content block is not valid base64.
    #[error("cannot decode content for {name:?}: {reason}")]
    DecodeContent {
        /// Destination entry name.
        name: String,
        /// Decoder message.
        reason: String,
    },

    /// One or more layers failed while closing the writer.
    #[error("cannot close archive: {}", join_failures(.failures))]
    Close {
        /// Every failing layer, innermost first.
        failures: Vec<CloseFailure>,
    },

    /// Writer was used before `open` succeeded.
    #[error("archive writer is not open")]
    NotOpen,

    /// Writer was opened twice.
    #[error("archive writer is already open")]
    AlreadyOpen,

    /// Writer was used after `close`.
    #[error("archive writer is closed")]
    Closed,
}

fn join_failures(failures: &[CloseFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ArchiveError {
    /// Returns `true` for user configuration errors.
    ///
    /// These are raised before any output exists and are never the result of
    /// filesystem state.
    ///
    /// # Examples
    ///
    /// ```
    /// use archivist_core::ArchiveError;
    ///
    /// let err = ArchiveError::UnsupportedFormat { name: "rar".into() };
    /// assert!(err.is_config_error());
    /// assert!(!ArchiveError::NotOpen.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::InvalidFileMode { .. }
        )
    }

    /// Returns `true` if the error concerns a single entry.
    ///
    /// Entry errors leave the writer usable; the next `add_*` call may
    /// succeed.
    #[must_use]
    pub const fn is_entry_error(&self) -> bool {
        matches!(
            self,
            Self::Symlink { .. }
                | Self::ReadSource { .. }
                | Self::WriteEntry { .. }
                | Self::DecodeContent { .. }
        )
    }

    /// Returns the close-stage failures, if this is a close error.
    #[must_use]
    pub fn close_failures(&self) -> Option<&[CloseFailure]> {
        match self {
            Self::Close { failures } => Some(failures),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_unsupported_format_display() {
        let err = ArchiveError::UnsupportedFormat { name: "rar".into() };
        assert_eq!(
            err.to_string(),
            "unsupported archive type \"rar\", only zip and tar.gz are supported"
        );
    }

    #[test]
    fn test_close_error_lists_every_layer() {
        let err = ArchiveError::Close {
            failures: vec![
                CloseFailure {
                    layer: CloseLayer::TarStream,
                    source: io::Error::other("short write"),
                },
                CloseFailure {
                    layer: CloseLayer::File,
                    source: io::Error::other("disk full"),
                },
            ],
        };
        let display = err.to_string();
        assert!(display.contains("tar stream: short write"));
        assert!(display.contains("output file: disk full"));
        assert_eq!(err.close_failures().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_classification() {
        let err = ArchiveError::InvalidFileMode {
            value: "999".into(),
            reason: "invalid digit".into(),
        };
        assert!(err.is_config_error());
        assert!(!err.is_entry_error());

        let err = ArchiveError::ReadSource {
            path: PathBuf::from("missing.txt"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.is_entry_error());
        assert!(!err.is_config_error());

        assert!(!ArchiveError::Closed.is_entry_error());
        assert!(ArchiveError::Closed.close_failures().is_none());
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = ArchiveError::CreateOutput {
            path: PathBuf::from("/nonexistent/out.zip"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/nonexistent/out.zip"));
    }
}
