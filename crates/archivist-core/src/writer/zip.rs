//! ZIP archive writer.
//!
//! Entries are deflate-compressed. File entries carry the source's unix
//! permission bits where the platform has them.

use super::ArchiveWriter;
use super::EntryOutcome;
use super::SourcePolicy;
use super::WriterState;
use crate::ArchiveError;
use crate::ArchiveFormat;
use crate::ArchiveSettings;
use crate::CloseFailure;
use crate::CloseLayer;
use crate::Result;
use crate::walker;
use crate::walker::WalkOptions;
use crate::walker::WalkReport;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Open state of a zip build.
struct ZipSession {
    zip: ZipWriter<File>,
    output: File,
    policy: SourcePolicy,
}

/// Writes a standard ZIP container.
///
/// # Examples
///
/// ```no_run
/// use archivist_core::ArchiveSettings;
/// use archivist_core::ArchiveWriter;
/// use archivist_core::writer::ZipArchiveWriter;
/// use std::path::Path;
///
/// let mut writer = ZipArchiveWriter::new();
/// writer.open(Path::new("site.zip"), ArchiveSettings::default())?;
/// let report = writer.add_dir(Path::new("/srv/site/public"), "public")?;
/// writer.close()?;
/// println!("{} files", report.files_added);
/// # Ok::<(), archivist_core::ArchiveError>(())
/// ```
#[derive(Default)]
pub struct ZipArchiveWriter {
    state: WriterState<ZipSession>,
}

impl ZipArchiveWriter {
    /// Creates an unopened zip writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
    }
}

fn write_err(name: &str, source: std::io::Error) -> ArchiveError {
    ArchiveError::WriteEntry {
        name: name.to_string(),
        source,
    }
}

fn zip_err(name: &str, err: zip::result::ZipError) -> ArchiveError {
    write_err(name, std::io::Error::other(err))
}

impl ArchiveWriter for ZipArchiveWriter {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn open(&mut self, output: &Path, settings: ArchiveSettings) -> Result<()> {
        self.state.ensure_unopened()?;

        let policy = SourcePolicy::from_settings(&settings)?;
        let (file, sync_handle) = super::create_output(output, settings.file_mode)?;

        tracing::debug!(
            path = %output.display(),
            mode = format_args!("{:o}", settings.file_mode),
            "opened zip archive"
        );

        self.state = WriterState::Open(ZipSession {
            zip: ZipWriter::new(file),
            output: sync_handle,
            policy,
        });
        Ok(())
    }

    fn add_file(&mut self, source: &Path, dest: &str) -> Result<EntryOutcome> {
        let session = self.state.session_mut()?;
        let Some(source) = session.policy.resolve_source(source)? else {
            return Ok(EntryOutcome::Excluded);
        };

        let (mut file, metadata) = super::open_source(&source)?;

        let options = Self::options().large_file(metadata.len() >= u64::from(u32::MAX));
        #[cfg(unix)]
        let options = {
            use std::os::unix::fs::PermissionsExt;
            options.unix_permissions(metadata.permissions().mode())
        };

        session
            .zip
            .start_file(dest, options)
            .map_err(|e| zip_err(dest, e))?;
        std::io::copy(&mut file, &mut session.zip).map_err(|e| write_err(dest, e))?;

        Ok(EntryOutcome::Written)
    }

    fn add_dir(&mut self, source: &Path, dest_prefix: &str) -> Result<WalkReport> {
        let session = self.state.session_mut()?;
        let options = WalkOptions {
            resolve_symlinks: session.policy.resolve_symlinks(),
            flatten: session.policy.flatten(),
        };
        walker::walk_dir(self, source, dest_prefix, options)
    }

    fn add_content(&mut self, content: &[u8], dest: &str) -> Result<()> {
        let session = self.state.session_mut()?;
        session
            .zip
            .start_file(dest, Self::options())
            .map_err(|e| zip_err(dest, e))?;
        session.zip.write_all(content).map_err(|e| write_err(dest, e))
    }

    fn close(&mut self) -> Result<()> {
        let ZipSession { zip, output, .. } = self.state.take_for_close()?;
        let mut failures = Vec::new();

        if let Err(e) = zip.finish() {
            failures.push(CloseFailure {
                layer: CloseLayer::ZipDirectory,
                source: std::io::Error::other(e),
            });
        }
        if let Err(e) = output.sync_all() {
            failures.push(CloseFailure {
                layer: CloseLayer::File,
                source: e,
            });
        }

        if failures.is_empty() {
            tracing::debug!("closed zip archive");
            Ok(())
        } else {
            Err(ArchiveError::Close { failures })
        }
    }
}
