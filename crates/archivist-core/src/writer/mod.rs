//! The archive writer contract and its zip and tar.gz implementations.
//!
//! A writer moves through `Unopened -> Open -> Closed`. Every `add_*` call
//! on an open writer succeeds or fails on its own without changing state;
//! calls in any other state fail fast.

pub mod tar;
pub mod zip;

use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::ArchiveSettings;
use crate::Result;
use crate::paths;
use crate::paths::ExcludeList;
use crate::walker::WalkReport;
use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;

pub use self::tar::TarGzArchiveWriter;
pub use self::zip::ZipArchiveWriter;

/// Result of adding a single filesystem file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// An entry was written.
    Written,
    /// The source is on the exclude list; nothing was written.
    Excluded,
}

/// Uniform contract for building one archive in one pass.
///
/// Entries are appended in call order and never rewritten. A writer is not
/// reusable: after [`close`](Self::close) every call fails with
/// [`ArchiveError::Closed`].
///
/// # Examples
///
/// ```no_run
/// use archivist_core::ArchiveFormat;
/// use archivist_core::ArchiveSettings;
/// use std::path::Path;
///
/// let mut writer = ArchiveFormat::Zip.writer();
/// writer.open(Path::new("out.zip"), ArchiveSettings::default())?;
/// writer.add_content(b"content", "content.txt")?;
/// writer.add_file(Path::new("/etc/hostname"), "hostname")?;
/// writer.close()?;
/// # Ok::<(), archivist_core::ArchiveError>(())
/// ```
pub trait ArchiveWriter {
    /// Format produced by this writer.
    fn format(&self) -> ArchiveFormat;

    /// Creates or truncates `output` and prepares the format encoder.
    ///
    /// The exclude list in `settings` is normalized to absolute paths before
    /// the file is created; if that fails nothing is created and the writer
    /// stays unopened.
    ///
    /// # Errors
    ///
    /// Returns an error if an exclude path cannot be made absolute, if the
    /// output file cannot be created, or if the writer was already opened.
    fn open(&mut self, output: &Path, settings: ArchiveSettings) -> Result<()>;

    /// Writes the content of `source` as an entry named `dest`.
    ///
    /// With symlink resolution enabled, a symlinked `source` is replaced by
    /// its target before the exclude check and before reading. Excluded
    /// sources are skipped without error.
    ///
    /// Duplicate names are handled by the format: zip rejects a name that is
    /// already in the archive with [`ArchiveError::WriteEntry`], while tar.gz
    /// appends a second entry and extractors keep the last one.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the entry cannot be
    /// written.
    fn add_file(&mut self, source: &Path, dest: &str) -> Result<EntryOutcome>;

    /// Recursively adds every regular file and symlink below `source`.
    ///
    /// Relative roots are made absolute first. Entry names are computed by
    /// [`paths::destination_for`] using `dest_prefix`, or by base name when
    /// flattening. FIFOs, sockets and devices are never opened; like any
    /// other failing entry they are logged and collected in the returned
    /// report, and the walk carries on with the remaining entries.
    ///
    /// # Errors
    ///
    /// Returns an error only if the root itself cannot be resolved or read.
    fn add_dir(&mut self, source: &Path, dest_prefix: &str) -> Result<WalkReport>;

    /// Writes `content` as an entry named `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    fn add_content(&mut self, content: &[u8], dest: &str) -> Result<()>;

    /// Finishes every layer and releases the output file.
    ///
    /// All layers are closed even when an inner one fails; every failure is
    /// reported in one [`ArchiveError::Close`].
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Close` if any layer failed, or a state error
    /// if the writer is not open.
    fn close(&mut self) -> Result<()>;
}

/// Lifecycle of a writer holding a format-specific open session `S`.
#[derive(Debug)]
pub(crate) enum WriterState<S> {
    Unopened,
    Open(S),
    Closed,
}

impl<S> Default for WriterState<S> {
    fn default() -> Self {
        Self::Unopened
    }
}

impl<S> WriterState<S> {
    pub(crate) fn ensure_unopened(&self) -> Result<()> {
        match self {
            Self::Unopened => Ok(()),
            Self::Open(_) => Err(ArchiveError::AlreadyOpen),
            Self::Closed => Err(ArchiveError::Closed),
        }
    }

    pub(crate) fn session_mut(&mut self) -> Result<&mut S> {
        match self {
            Self::Open(session) => Ok(session),
            Self::Unopened => Err(ArchiveError::NotOpen),
            Self::Closed => Err(ArchiveError::Closed),
        }
    }

    /// Moves the session out, leaving the writer closed.
    pub(crate) fn take_for_close(&mut self) -> Result<S> {
        match std::mem::replace(self, Self::Closed) {
            Self::Open(session) => Ok(session),
            Self::Unopened => {
                *self = Self::Unopened;
                Err(ArchiveError::NotOpen)
            }
            Self::Closed => Err(ArchiveError::Closed),
        }
    }
}

/// Source handling rules fixed at open time.
#[derive(Debug)]
pub(crate) struct SourcePolicy {
    exclude: ExcludeList,
    resolve_symlinks: bool,
    flatten: bool,
}

impl SourcePolicy {
    pub(crate) fn from_settings(settings: &ArchiveSettings) -> Result<Self> {
        Ok(Self {
            exclude: ExcludeList::resolve(&settings.exclude_list)?,
            resolve_symlinks: settings.resolve_symlinks,
            flatten: settings.flatten,
        })
    }

    pub(crate) const fn resolve_symlinks(&self) -> bool {
        self.resolve_symlinks
    }

    pub(crate) const fn flatten(&self) -> bool {
        self.flatten
    }

    /// Returns the path to read for `source`, or `None` if it is excluded.
    pub(crate) fn resolve_source(&self, source: &Path) -> Result<Option<PathBuf>> {
        let resolved = if self.resolve_symlinks {
            paths::resolve_symlink(source)?
        } else {
            source.to_path_buf()
        };

        if !self.exclude.is_empty() && self.exclude.contains(&paths::absolutize(&resolved)?) {
            tracing::debug!(path = %resolved.display(), "excluded from archive");
            return Ok(None);
        }
        Ok(Some(resolved))
    }
}

/// Creates or truncates the output file with the requested permission bits.
///
/// Returns the handle for the encoder and a second handle used to sync the
/// file once every layer is finished.
pub(crate) fn create_output(path: &Path, mode: u32) -> Result<(File, File)> {
    let create_err = |source| ArchiveError::CreateOutput {
        path: path.to_path_buf(),
        source,
    };

    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let file = options.open(path).map_err(create_err)?;
    let sync_handle = file.try_clone().map_err(create_err)?;
    Ok((file, sync_handle))
}

/// Opens a source file for reading, rejecting anything but regular files.
///
/// The type is checked before opening: opening a FIFO blocks until a writer
/// shows up.
pub(crate) fn open_source(path: &Path) -> Result<(File, std::fs::Metadata)> {
    let read_err = |source| ArchiveError::ReadSource {
        path: path.to_path_buf(),
        source,
    };

    let file_type = std::fs::metadata(path).map_err(read_err)?.file_type();
    if file_type.is_dir() {
        return Err(read_err(std::io::Error::new(
            std::io::ErrorKind::IsADirectory,
            "source is a directory",
        )));
    }
    if !file_type.is_file() {
        return Err(read_err(not_regular_file()));
    }

    let file = File::open(path).map_err(read_err)?;
    let metadata = file.metadata().map_err(read_err)?;
    Ok((file, metadata))
}

pub(crate) fn not_regular_file() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_state_transitions() {
        let mut state: WriterState<u8> = WriterState::default();
        assert!(state.ensure_unopened().is_ok());
        assert!(matches!(state.session_mut(), Err(ArchiveError::NotOpen)));
        assert!(matches!(state.take_for_close(), Err(ArchiveError::NotOpen)));
        assert!(state.ensure_unopened().is_ok(), "failed close keeps unopened");

        state = WriterState::Open(7);
        assert!(matches!(state.ensure_unopened(), Err(ArchiveError::AlreadyOpen)));
        assert_eq!(*state.session_mut().unwrap(), 7);
        assert_eq!(state.take_for_close().unwrap(), 7);

        assert!(matches!(state.session_mut(), Err(ArchiveError::Closed)));
        assert!(matches!(state.take_for_close(), Err(ArchiveError::Closed)));
        assert!(matches!(state.ensure_unopened(), Err(ArchiveError::Closed)));
    }

    #[test]
    fn test_policy_excludes_resolved_path() {
        let temp = TempDir::new().unwrap();
        let skipped = temp.path().join("skip.txt");
        let kept = temp.path().join("keep.txt");
        fs::write(&skipped, "s").unwrap();
        fs::write(&kept, "k").unwrap();

        let settings = ArchiveSettings::default().with_exclude_list(vec![skipped.clone()]);
        let policy = SourcePolicy::from_settings(&settings).unwrap();

        assert_eq!(policy.resolve_source(&skipped).unwrap(), None);
        assert_eq!(policy.resolve_source(&kept).unwrap(), Some(kept));
    }

    #[cfg(unix)]
    #[test]
    fn test_policy_checks_exclusion_after_symlink_resolution() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("secret.txt");
        let link = temp.path().join("link.txt");
        fs::write(&target, "s").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let settings = ArchiveSettings::default()
            .with_resolve_symlinks(true)
            .with_exclude_list(vec![target]);
        let policy = SourcePolicy::from_settings(&settings).unwrap();
        assert_eq!(policy.resolve_source(&link).unwrap(), None);

        let settings = ArchiveSettings::default().with_exclude_list(vec![temp.path().join("secret.txt")]);
        let policy = SourcePolicy::from_settings(&settings).unwrap();
        assert_eq!(policy.resolve_source(&link).unwrap(), Some(link));
    }

    #[cfg(unix)]
    #[test]
    fn test_create_output_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.bin");
        let (_file, _sync) = create_output(&path, 0o600).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_create_output_missing_parent() {
        let temp = TempDir::new().unwrap();
        let err = create_output(&temp.path().join("no/such/dir/out.zip"), 0o644).unwrap_err();
        assert!(matches!(err, ArchiveError::CreateOutput { .. }));
    }

    #[test]
    fn test_open_source_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let err = open_source(temp.path()).unwrap_err();
        assert!(err.is_entry_error());
    }

    #[cfg(unix)]
    #[test]
    fn test_open_source_rejects_socket() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.sock");
        let _listener = std::os::unix::net::UnixListener::bind(&path).unwrap();

        let err = open_source(&path).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::ReadSource { ref source, .. } if source.kind() == std::io::ErrorKind::InvalidInput
        ));
    }
}
