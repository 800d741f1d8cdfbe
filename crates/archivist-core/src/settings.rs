//! Per-build archive settings.

use crate::ArchiveError;
use crate::Result;
use std::path::PathBuf;

/// Permission bits used for the output file when none are configured.
pub const DEFAULT_FILE_MODE: u32 = 0o666;

/// Settings for a single archive build.
///
/// Constructed by the caller, then moved into the writer by
/// [`ArchiveWriter::open`](crate::ArchiveWriter::open). The writer
/// normalizes `exclude_list` at that point and never changes the settings
/// afterwards.
///
/// # Examples
///
/// ```
/// use archivist_core::ArchiveSettings;
///
/// let settings = ArchiveSettings::default()
///     .with_file_mode(0o644)
///     .with_resolve_symlinks(true)
///     .with_exclude_list(vec!["secrets.env".into()]);
///
/// assert_eq!(settings.file_mode, 0o644);
/// assert!(settings.resolve_symlinks);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSettings {
    /// Paths that must never be written into the archive.
    ///
    /// May be relative or unclean; they are made absolute on open.
    ///
    /// Default: empty.
    pub exclude_list: Vec<PathBuf>,

    /// Permission bits of the created archive file.
    ///
    /// Default: `0o666` (subject to the process umask).
    pub file_mode: u32,

    /// Replace symlinked sources by their targets before reading.
    ///
    /// Default: `false`.
    pub resolve_symlinks: bool,

    /// Name files found by a directory walk by their base name only.
    ///
    /// Default: `false`.
    pub flatten: bool,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            exclude_list: Vec::new(),
            file_mode: DEFAULT_FILE_MODE,
            resolve_symlinks: false,
            flatten: false,
        }
    }
}

impl ArchiveSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exclude list.
    #[must_use]
    pub fn with_exclude_list(mut self, paths: Vec<PathBuf>) -> Self {
        self.exclude_list = paths;
        self
    }

    /// Sets the output file permission bits.
    #[must_use]
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Sets whether symlinked sources are resolved.
    #[must_use]
    pub fn with_resolve_symlinks(mut self, resolve: bool) -> Self {
        self.resolve_symlinks = resolve;
        self
    }

    /// Sets whether directory walks flatten entry names.
    #[must_use]
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }
}

/// Parses an octal permission string such as `"644"` or `"0o755"`.
///
/// # Errors
///
/// Returns `ArchiveError::InvalidFileMode` if the string is empty, contains
/// non-octal digits, or exceeds `0o7777`.
///
/// # Examples
///
/// ```
/// use archivist_core::settings::parse_file_mode;
///
/// assert_eq!(parse_file_mode("644")?, 0o644);
/// assert_eq!(parse_file_mode("0755")?, 0o755);
/// assert_eq!(parse_file_mode("0o600")?, 0o600);
/// assert!(parse_file_mode("999").is_err());
/// # Ok::<(), archivist_core::ArchiveError>(())
/// ```
pub fn parse_file_mode(value: &str) -> Result<u32> {
    let invalid = |reason: String| ArchiveError::InvalidFileMode {
        value: value.to_string(),
        reason,
    };

    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(invalid("empty mode".to_string()));
    }

    let mode = u32::from_str_radix(digits, 8).map_err(|e| invalid(e.to_string()))?;
    if mode > 0o7777 {
        return Err(invalid(format!("{mode:#o} exceeds 0o7777")));
    }
    Ok(mode)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ArchiveSettings::default();
        assert_eq!(settings.file_mode, 0o666);
        assert!(!settings.resolve_symlinks);
        assert!(!settings.flatten);
        assert!(settings.exclude_list.is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let settings = ArchiveSettings::new()
            .with_flatten(true)
            .with_exclude_list(vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert!(settings.flatten);
        assert_eq!(settings.exclude_list.len(), 2);
    }

    #[test]
    fn test_parse_file_mode_accepts_octal() {
        assert_eq!(parse_file_mode("666").unwrap(), 0o666);
        assert_eq!(parse_file_mode(" 0644 ").unwrap(), 0o644);
        assert_eq!(parse_file_mode("4755").unwrap(), 0o4755);
    }

    #[test]
    fn test_parse_file_mode_rejects_garbage() {
        for bad in ["", "0o", "rw-r--r--", "8", "-644", "77777"] {
            let err = parse_file_mode(bad).unwrap_err();
            assert!(err.is_config_error(), "{bad:?} should be a config error");
        }
    }
}
