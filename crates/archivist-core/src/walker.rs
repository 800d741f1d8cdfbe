//! Best-effort recursive directory archiving.
//!
//! A directory walk never stops at a bad entry: unreadable files,
//! unreadable subdirectories and write failures are logged, recorded in the
//! [`WalkReport`], and the walk moves on to the next sibling. Only a root
//! that cannot be read at all fails the call. Partial archives are an
//! accepted outcome.

use crate::ArchiveError;
use crate::ArchiveWriter;
use crate::Result;
use crate::paths;
use crate::writer::EntryOutcome;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Options a walk inherits from the writer's settings.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WalkOptions {
    pub(crate) resolve_symlinks: bool,
    pub(crate) flatten: bool,
}

/// A single entry that could not be archived during a walk.
#[derive(Debug)]
pub struct WalkFailure {
    /// Filesystem path of the failing entry.
    pub path: PathBuf,
    /// Why it was skipped.
    pub error: ArchiveError,
}

/// Outcome of a directory walk.
///
/// # Examples
///
/// ```
/// use archivist_core::WalkReport;
///
/// let report = WalkReport::default();
/// assert!(report.is_complete());
/// assert_eq!(report.files_added, 0);
/// ```
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Number of entries written.
    pub files_added: usize,
    /// Number of files skipped because they are on the exclude list.
    pub files_excluded: usize,
    /// Entries that failed and were skipped.
    pub failures: Vec<WalkFailure>,
}

impl WalkReport {
    /// Returns `true` if no entry failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.files_added += other.files_added;
        self.files_excluded += other.files_excluded;
        self.failures.extend(other.failures);
    }

    fn record_failure(&mut self, path: PathBuf, error: ArchiveError) {
        tracing::warn!(path = %path.display(), error = %error, "skipping entry");
        self.failures.push(WalkFailure { path, error });
    }
}

/// Walks `source` and adds every regular file and symlink to `writer`.
///
/// Entries are visited in file-name order. Symlinks below the root are not
/// followed as directories; they are handed to `add_file` like any other
/// entry, which resolves them when the writer is configured to. Any other
/// special file is recorded as a failure without being opened.
pub(crate) fn walk_dir<W: ArchiveWriter + ?Sized>(
    writer: &mut W,
    source: &Path,
    dest_prefix: &str,
    options: WalkOptions,
) -> Result<WalkReport> {
    let root = if options.resolve_symlinks {
        paths::resolve_symlink(source)?
    } else {
        source.to_path_buf()
    };
    let root = paths::absolutize(&root)?;

    let metadata = std::fs::metadata(&root).map_err(|source| ArchiveError::ReadSource {
        path: root.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ArchiveError::ReadSource {
            path: root,
            source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        });
    }

    let mut report = WalkReport::default();
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(ArchiveError::ReadSource {
                    path: root,
                    source: err.into(),
                });
            }
            Err(err) => {
                let path = err.path().map_or_else(|| root.clone(), Path::to_path_buf);
                report.record_failure(path.clone(), ArchiveError::ReadSource {
                    path,
                    source: err.into(),
                });
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        if !file_type.is_file() && !file_type.is_symlink() {
            report.record_failure(path.to_path_buf(), ArchiveError::ReadSource {
                path: path.to_path_buf(),
                source: crate::writer::not_regular_file(),
            });
            continue;
        }

        let dest = if options.flatten {
            paths::flattened_name(path)
        } else {
            paths::destination_for(path, &root, dest_prefix)
        };

        match writer.add_file(path, &dest) {
            Ok(EntryOutcome::Written) => report.files_added += 1,
            Ok(EntryOutcome::Excluded) => report.files_excluded += 1,
            Err(err) => report.record_failure(path.to_path_buf(), err),
        }
    }

    tracing::debug!(
        root = %root.display(),
        added = report.files_added,
        excluded = report.files_excluded,
        failed = report.failures.len(),
        "directory walk finished"
    );

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ArchiveFormat;
    use crate::ArchiveSettings;
    use std::fs;
    use tempfile::TempDir;

    /// Records every call instead of writing an archive.
    #[derive(Default)]
    struct RecordingWriter {
        added: Vec<(PathBuf, String)>,
        fail_on: Option<String>,
    }

    impl ArchiveWriter for RecordingWriter {
        fn format(&self) -> ArchiveFormat {
            ArchiveFormat::Zip
        }

        fn open(&mut self, _output: &Path, _settings: ArchiveSettings) -> Result<()> {
            Ok(())
        }

        fn add_file(&mut self, source: &Path, dest: &str) -> Result<EntryOutcome> {
            if self.fail_on.as_deref() == Some(dest) {
                return Err(ArchiveError::WriteEntry {
                    name: dest.to_string(),
                    source: std::io::Error::other("boom"),
                });
            }
            self.added.push((source.to_path_buf(), dest.to_string()));
            Ok(EntryOutcome::Written)
        }

        fn add_dir(&mut self, source: &Path, dest_prefix: &str) -> Result<WalkReport> {
            walk_dir(self, source, dest_prefix, WalkOptions::default())
        }

        fn add_content(&mut self, _content: &[u8], _dest: &str) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn create_tree(root: &Path) {
        fs::create_dir_all(root.join("data/sub/deeper")).unwrap();
        fs::write(root.join("data/a.txt"), "a").unwrap();
        fs::write(root.join("data/sub/b.txt"), "b").unwrap();
        fs::write(root.join("data/sub/deeper/c.txt"), "c").unwrap();
    }

    #[test]
    fn test_walk_visits_every_file_in_order() {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path());
        let mut writer = RecordingWriter::default();

        let report = writer.add_dir(&temp.path().join("data"), "data").unwrap();

        assert_eq!(report.files_added, 3);
        assert!(report.is_complete());
        let names: Vec<_> = writer.added.iter().map(|(_, d)| d.as_str()).collect();
        assert_eq!(names, ["data/a.txt", "data/sub/b.txt", "data/sub/deeper/c.txt"]);
    }

    #[test]
    fn test_walk_continues_after_entry_failure() {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path());
        let mut writer = RecordingWriter {
            fail_on: Some("data/sub/b.txt".to_string()),
            ..RecordingWriter::default()
        };

        let report = writer.add_dir(&temp.path().join("data"), "data").unwrap();

        assert_eq!(report.files_added, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("sub/b.txt"));
        assert!(writer.added.iter().any(|(_, d)| d == "data/sub/deeper/c.txt"));
    }

    #[test]
    fn test_walk_flatten_uses_base_names() {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path());
        let mut writer = RecordingWriter::default();
        let options = WalkOptions {
            flatten: true,
            ..WalkOptions::default()
        };

        walk_dir(&mut writer, &temp.path().join("data"), "data", options).unwrap();

        let names: Vec<_> = writer.added.iter().map(|(_, d)| d.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_walk_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        let mut writer = RecordingWriter::default();
        let err = writer.add_dir(&temp.path().join("missing"), "missing").unwrap_err();
        assert!(matches!(err, ArchiveError::ReadSource { .. }));
    }

    #[test]
    fn test_walk_root_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        let mut writer = RecordingWriter::default();
        assert!(writer.add_dir(&file, "plain.txt").is_err());
        assert!(writer.added.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_hands_symlinks_to_add_file() {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path());
        std::os::unix::fs::symlink(
            temp.path().join("data/a.txt"),
            temp.path().join("data/link.txt"),
        )
        .unwrap();
        let mut writer = RecordingWriter::default();

        let report = writer.add_dir(&temp.path().join("data"), "data").unwrap();

        assert_eq!(report.files_added, 4);
        assert!(writer.added.iter().any(|(_, d)| d == "data/link.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_fifo() {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path());
        let fifo = temp.path().join("data/pipe");
        let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());
        let mut writer = RecordingWriter::default();

        let report = writer.add_dir(&temp.path().join("data"), "data").unwrap();

        assert_eq!(report.files_added, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, fifo);
        assert!(writer.added.iter().all(|(_, d)| d != "data/pipe"));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_relative_root_falls_back_to_absolute_name() {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path());

        // Walk up from the working directory to reach the temp dir by a
        // relative path.
        let cwd = std::env::current_dir().unwrap();
        let mut relative = PathBuf::new();
        for _ in cwd.components().skip(1) {
            relative.push("..");
        }
        let relative = relative.join(temp.path().strip_prefix("/").unwrap()).join("data");
        assert!(relative.is_relative());

        let mut writer = RecordingWriter::default();
        writer.add_dir(&relative, "zzz").unwrap();

        let expected = paths::absolutize(&relative.join("a.txt")).unwrap();
        assert_eq!(writer.added[0].1, expected.to_string_lossy());
        assert!(Path::new(&writer.added[0].1).is_absolute());
    }

    #[test]
    fn test_report_merge() {
        let mut a = WalkReport {
            files_added: 2,
            ..WalkReport::default()
        };
        let b = WalkReport {
            files_added: 1,
            files_excluded: 3,
            failures: vec![WalkFailure {
                path: PathBuf::from("x"),
                error: ArchiveError::NotOpen,
            }],
        };
        a.merge(b);
        assert_eq!(a.files_added, 3);
        assert_eq!(a.files_excluded, 3);
        assert!(!a.is_complete());
    }
}
