//! Declarative archive builds.
//!
//! An [`ArchivePlan`] lists everything that goes into one archive. Building
//! it opens a writer, adds every item, closes the writer and reports the
//! finished file's checksums. Individual items that fail are logged and
//! recorded as warnings; only configuration errors, failure to create the
//! output, and close errors fail the build.

use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::ArchiveResult;
use crate::ArchiveSettings;
use crate::ArchiveWriter;
use crate::EntryOutcome;
use crate::Result;
use crate::paths;
use crate::settings::DEFAULT_FILE_MODE;
use crate::settings::parse_file_mode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use std::path::PathBuf;

/// An in-memory entry, given as base64 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    /// Base64 (standard alphabet, padded) encoded entry content.
    pub src_base64: String,
    /// Entry name inside the archive.
    pub file_path: String,
}

impl ContentBlock {
    /// Creates a content block from already-encoded text.
    pub fn new(src_base64: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            src_base64: src_base64.into(),
            file_path: file_path.into(),
        }
    }

    /// Creates a content block by encoding raw bytes.
    pub fn from_bytes(bytes: &[u8], file_path: impl Into<String>) -> Self {
        Self::new(STANDARD.encode(bytes), file_path)
    }
}

/// Description of one archive build.
///
/// # Examples
///
/// ```no_run
/// use archivist_core::ArchivePlan;
/// use archivist_core::plan::ContentBlock;
///
/// let report = ArchivePlan::new("dist/site.zip", "zip")
///     .with_out_mode("644")
///     .with_dir("public")
///     .with_file("README.md")
///     .with_content(ContentBlock::from_bytes(b"v1\n", "VERSION"))
///     .build()?;
///
/// println!("{} -> {}", report.path.display(), report.result.sha256);
/// # Ok::<(), archivist_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePlan {
    /// Output file; relative names are resolved against the current directory.
    pub name: PathBuf,
    /// Format name, `"zip"` or `"tar.gz"`.
    pub format: String,
    /// Octal permission string for the output file. `None` means `0666`.
    pub out_mode: Option<String>,
    /// Replace symlinked sources by their targets.
    pub resolve_symlinks: bool,
    /// Paths never written into the archive.
    pub exclude_list: Vec<PathBuf>,
    /// Single files to add.
    pub files: Vec<PathBuf>,
    /// Directories to add recursively.
    pub dirs: Vec<PathBuf>,
    /// In-memory entries to add.
    pub contents: Vec<ContentBlock>,
}

/// An item that was skipped while building.
#[derive(Debug)]
pub struct PlanWarning {
    /// The plan item (path or content entry name) that failed.
    pub item: String,
    /// What went wrong.
    pub error: ArchiveError,
}

/// Outcome of [`ArchivePlan::build`].
#[derive(Debug)]
pub struct BuildReport {
    /// Absolute path of the written archive.
    pub path: PathBuf,
    /// Format that was written.
    pub format: ArchiveFormat,
    /// Size and digests of the archive.
    pub result: ArchiveResult,
    /// Number of entries written.
    pub entries_written: usize,
    /// Number of sources skipped by the exclude list.
    pub entries_excluded: usize,
    /// Items that failed and were skipped.
    pub warnings: Vec<PlanWarning>,
}

impl ArchivePlan {
    /// Creates an empty plan for `name` in the format named `format`.
    pub fn new(name: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: format.into(),
            out_mode: None,
            resolve_symlinks: false,
            exclude_list: Vec::new(),
            files: Vec::new(),
            dirs: Vec::new(),
            contents: Vec::new(),
        }
    }

    /// Sets the octal permission string of the output file.
    #[must_use]
    pub fn with_out_mode(mut self, mode: impl Into<String>) -> Self {
        self.out_mode = Some(mode.into());
        self
    }

    /// Sets whether symlinked sources are resolved.
    #[must_use]
    pub fn with_resolve_symlinks(mut self, resolve: bool) -> Self {
        self.resolve_symlinks = resolve;
        self
    }

    /// Adds a path to the exclude list.
    #[must_use]
    pub fn with_exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude_list.push(path.into());
        self
    }

    /// Adds a single file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Adds a directory.
    #[must_use]
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.push(path.into());
        self
    }

    /// Adds an in-memory entry.
    #[must_use]
    pub fn with_content(mut self, content: ContentBlock) -> Self {
        self.contents.push(content);
        self
    }

    /// Parses the format and permission string and builds writer settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown format or a malformed
    /// permission string.
    pub fn settings(&self) -> Result<(ArchiveFormat, ArchiveSettings)> {
        let format: ArchiveFormat = self.format.parse()?;
        let file_mode = match &self.out_mode {
            Some(mode) => parse_file_mode(mode)?,
            None => DEFAULT_FILE_MODE,
        };

        let settings = ArchiveSettings::default()
            .with_file_mode(file_mode)
            .with_resolve_symlinks(self.resolve_symlinks)
            .with_exclude_list(self.exclude_list.clone());
        Ok((format, settings))
    }

    /// Writes the archive and computes its checksums.
    ///
    /// Files are added first, then directories, then content blocks. Each
    /// source is made absolute; its entry name is the source path cleaned
    /// with leading `..` components stripped.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan is misconfigured, the output cannot be
    /// created or closed, or the finished archive cannot be hashed.
    pub fn build(&self) -> Result<BuildReport> {
        let (format, settings) = self.settings()?;
        let path = paths::absolutize(&self.name)?;

        let mut writer = format.writer();
        writer.open(&path, settings)?;

        let mut report = BuildReport {
            path,
            format,
            result: ArchiveResult::default(),
            entries_written: 0,
            entries_excluded: 0,
            warnings: Vec::new(),
        };

        for file in &self.files {
            match add_file(writer.as_mut(), file) {
                Ok(EntryOutcome::Written) => report.entries_written += 1,
                Ok(EntryOutcome::Excluded) => report.entries_excluded += 1,
                Err(error) => report.warn(file.display().to_string(), error),
            }
        }

        for dir in &self.dirs {
            match add_dir(writer.as_mut(), dir) {
                Ok(walk) => {
                    report.entries_written += walk.files_added;
                    report.entries_excluded += walk.files_excluded;
                    for failure in walk.failures {
                        report.warnings.push(PlanWarning {
                            item: failure.path.display().to_string(),
                            error: failure.error,
                        });
                    }
                }
                Err(error) => report.warn(dir.display().to_string(), error),
            }
        }

        for content in &self.contents {
            let dest = paths::clean_entry_path(Path::new(&content.file_path));
            let added = STANDARD
                .decode(content.src_base64.trim())
                .map_err(|e| ArchiveError::DecodeContent {
                    name: dest.clone(),
                    reason: e.to_string(),
                })
                .and_then(|bytes| writer.add_content(&bytes, &dest));
            match added {
                Ok(()) => report.entries_written += 1,
                Err(error) => report.warn(dest, error),
            }
        }

        writer.close()?;

        report.result = ArchiveResult::compute(&report.path)?;
        tracing::info!(
            path = %report.path.display(),
            format = %format,
            entries = report.entries_written,
            size = report.result.size,
            "archive written"
        );
        Ok(report)
    }
}

impl BuildReport {
    fn warn(&mut self, item: String, error: ArchiveError) {
        tracing::error!(item = %item, error = %error, "cannot add item to archive");
        self.warnings.push(PlanWarning { item, error });
    }
}

fn add_file(writer: &mut dyn ArchiveWriter, source: &Path) -> Result<EntryOutcome> {
    let absolute = paths::absolutize(source)?;
    writer.add_file(&absolute, &paths::clean_entry_path(source))
}

fn add_dir(writer: &mut dyn ArchiveWriter, source: &Path) -> Result<crate::WalkReport> {
    let absolute = paths::absolutize(source)?;
    writer.add_dir(&absolute, &paths::clean_entry_path(source))
}

/// Recomputes the result for an archive that was built earlier.
///
/// Returns `None` if the file no longer exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be stat'd or read.
///
/// # Examples
///
/// ```no_run
/// use archivist_core::plan::refresh;
///
/// match refresh("dist/site.zip")? {
///     Some(result) => println!("still there: {}", result.sha256),
///     None => println!("archive was deleted"),
/// }
/// # Ok::<(), archivist_core::ArchiveError>(())
/// ```
pub fn refresh<P: AsRef<Path>>(path: P) -> Result<Option<ArchiveResult>> {
    let path = path.as_ref();
    match std::fs::metadata(path) {
        Ok(_) => ArchiveResult::compute(path).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "archive no longer exists");
            Ok(None)
        }
        Err(source) => Err(ArchiveError::ReadSource {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_settings_defaults() {
        let (format, settings) = ArchivePlan::new("a.zip", "zip").settings().unwrap();
        assert_eq!(format, ArchiveFormat::Zip);
        assert_eq!(settings.file_mode, DEFAULT_FILE_MODE);
    }

    #[test]
    fn test_settings_rejects_bad_config() {
        let err = ArchivePlan::new("a.rar", "rar").settings().unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedFormat { .. }));

        let err = ArchivePlan::new("a.zip", "zip")
            .with_out_mode("rwx")
            .settings()
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidFileMode { .. }));
    }

    #[test]
    fn test_build_rejects_unknown_format_without_creating_output() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("a.rar");
        assert!(ArchivePlan::new(&out, "rar").build().is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_build_collects_item_failures() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("present.txt");
        fs::write(&present, "here").unwrap();
        let out = temp.path().join("out.tar.gz");

        let report = ArchivePlan::new(&out, "tar.gz")
            .with_file(&present)
            .with_file(temp.path().join("missing.txt"))
            .with_dir(temp.path().join("missing-dir"))
            .with_content(ContentBlock::new("not base64!", "bad.txt"))
            .with_content(ContentBlock::from_bytes(b"ok", "../ok.txt"))
            .build()
            .unwrap();

        assert_eq!(report.entries_written, 2);
        assert_eq!(report.warnings.len(), 3);
        assert!(
            report
                .warnings
                .iter()
                .any(|w| matches!(w.error, ArchiveError::DecodeContent { .. }))
        );
        assert_eq!(report.path, out);
        assert_eq!(report.result, ArchiveResult::compute(&out).unwrap());
    }

    #[test]
    fn test_refresh_detects_deletion() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out.zip");

        let report = ArchivePlan::new(&out, "zip")
            .with_content(ContentBlock::from_bytes(b"x", "x.txt"))
            .build()
            .unwrap();

        assert_eq!(refresh(&out).unwrap(), Some(report.result));
        fs::remove_file(&out).unwrap();
        assert_eq!(refresh(&out).unwrap(), None);
    }
}
