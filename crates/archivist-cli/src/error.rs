//! Error conversion utilities for CLI.
//!
//! Converts archivist-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use archivist_core::ArchiveError;
use std::path::Path;

/// Converts `ArchiveError` to user-friendly anyhow error with context
pub fn convert_archive_error(err: ArchiveError, archive: &Path) -> anyhow::Error {
    match err {
        ArchiveError::UnsupportedFormat { name } => {
            anyhow!(
                "Archive format not supported: '{name}'\n\
                 HINT: Supported formats: zip, tar.gz (names are case-sensitive)."
            )
        }
        ArchiveError::InvalidFileMode { value, reason } => {
            anyhow!(
                "Invalid output file mode '{value}': {reason}\n\
                 HINT: Use octal permission bits such as 644 or 0600."
            )
        }
        ArchiveError::CreateOutput { path, source } => {
            anyhow!(
                "Cannot create archive '{}': {}\n\
                 HINT: Check that the parent directory exists and is writable.",
                path.display(),
                source
            )
        }
        ArchiveError::ResolvePath { path, source } => {
            anyhow!(
                "Cannot resolve path '{}' for '{}': {}\n\
                 HINT: Check the --exclude and output paths.",
                path.display(),
                archive.display(),
                source
            )
        }
        err @ ArchiveError::Close { .. } => {
            anyhow!(
                "{err}\n\
                 HINT: '{}' is likely incomplete; rebuild it before use.",
                archive.display()
            )
        }
        _ => anyhow::Error::from(err).context(format!("Error building archive '{}'", archive.display())),
    }
}
