//! Gzip-compressed tar archive writer.
//!
//! Entry names are written exactly as given. The `tar` crate's path setters
//! reject absolute names and `..` components, which callers of a directory
//! walk legitimately produce, so names are placed into the header directly
//! and names over 100 bytes get a GNU long-name record.

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
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;
use tar::Builder;
use tar::EntryType;
use tar::Header;

/// Permission bits of entries created from in-memory content.
const CONTENT_MODE: u32 = 0o644;

/// Mode bits kept from the source; file-type bits are left to the type flag.
const PERMISSION_BITS: u32 = 0o7777;

/// Length of the name field in a tar header.
const NAME_FIELD_LEN: usize = 100;

/// Open state of a tar.gz build.
struct TarSession {
    builder: Builder<GzEncoder<File>>,
    output: File,
    policy: SourcePolicy,
}

/// Writes a tar stream compressed with gzip.
///
/// File entries are buffered in memory so the header size always matches the
/// bytes actually read from the source.
///
/// Closing finishes the tar stream, then the gzip stream, then syncs the
/// file. A failure in one layer does not stop the others from being
/// closed.
///
/// # Examples
///
/// ```no_run
/// use archivist_core::ArchiveSettings;
/// use archivist_core::ArchiveWriter;
/// use archivist_core::writer::TarGzArchiveWriter;
/// use std::path::Path;
///
/// let mut writer = TarGzArchiveWriter::new();
/// writer.open(Path::new("backup.tar.gz"), ArchiveSettings::default())?;
/// writer.add_content(b"v1.2.0\n", "VERSION")?;
/// writer.close()?;
/// # Ok::<(), archivist_core::ArchiveError>(())
/// ```
#[derive(Default)]
pub struct TarGzArchiveWriter {
    state: WriterState<TarSession>,
}

impl TarGzArchiveWriter {
    /// Creates an unopened tar.gz writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn write_err(name: &str, source: io::Error) -> ArchiveError {
    ArchiveError::WriteEntry {
        name: name.to_string(),
        source,
    }
}

/// Appends `data` under `name`, bypassing path validation.
///
/// `header` must already carry size, mode and entry type.
fn append_named<R: Read>(
    builder: &mut Builder<GzEncoder<File>>,
    header: &mut Header,
    name: &str,
    data: R,
) -> io::Result<()> {
    let bytes = name.as_bytes();

    if bytes.len() > NAME_FIELD_LEN {
        let mut long = Header::new_gnu();
        let marker = b"././@LongLink";
        long.as_old_mut().name[..marker.len()].copy_from_slice(marker);
        long.set_mode(0o644);
        long.set_uid(0);
        long.set_gid(0);
        long.set_mtime(0);
        long.set_size(bytes.len() as u64 + 1);
        long.set_entry_type(EntryType::GNULongName);
        long.set_cksum();
        builder.append(&long, bytes.chain(io::repeat(0).take(1)))?;
    }

    let field = &mut header.as_old_mut().name;
    field.fill(0);
    let len = bytes.len().min(NAME_FIELD_LEN);
    field[..len].copy_from_slice(&bytes[..len]);
    header.set_cksum();

    builder.append(header, data)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

impl ArchiveWriter for TarGzArchiveWriter {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::TarGz
    }

    fn open(&mut self, output: &Path, settings: ArchiveSettings) -> Result<()> {
        self.state.ensure_unopened()?;

        let policy = SourcePolicy::from_settings(&settings)?;
        let (file, sync_handle) = super::create_output(output, settings.file_mode)?;

        tracing::debug!(
            path = %output.display(),
            mode = format_args!("{:o}", settings.file_mode),
            "opened tar.gz archive"
        );

        let encoder = GzEncoder::new(file, Compression::default());
        self.state = WriterState::Open(TarSession {
            builder: Builder::new(encoder),
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

        // The header size must match the bytes that follow it, and stat sizes
        // lie for growing files and procfs.
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(|e| ArchiveError::ReadSource {
            path: source.clone(),
            source: e,
        })?;

        let mut header = Header::new_gnu();
        header.set_metadata(&metadata);
        header.set_size(data.len() as u64);
        if let Ok(mode) = header.mode() {
            header.set_mode(mode & PERMISSION_BITS);
        }
        header.set_entry_type(EntryType::Regular);

        append_named(&mut session.builder, &mut header, dest, data.as_slice())
            .map_err(|e| write_err(dest, e))?;

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

        let mut header = Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(CONTENT_MODE);
        header.set_entry_type(EntryType::Regular);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(unix_now());

        append_named(&mut session.builder, &mut header, dest, content)
            .map_err(|e| write_err(dest, e))
    }

    fn close(&mut self) -> Result<()> {
        let TarSession {
            mut builder,
            output,
            ..
        } = self.state.take_for_close()?;
        let mut failures = Vec::new();

        if let Err(e) = builder.finish() {
            failures.push(CloseFailure {
                layer: CloseLayer::TarStream,
                source: e,
            });
        }

        match builder.into_inner() {
            Ok(encoder) => {
                if let Err(e) = encoder.finish() {
                    failures.push(CloseFailure {
                        layer: CloseLayer::Gzip,
                        source: e,
                    });
                }
            }
            Err(e) => failures.push(CloseFailure {
                layer: CloseLayer::TarStream,
                source: e,
            }),
        }

        if let Err(e) = output.sync_all() {
            failures.push(CloseFailure {
                layer: CloseLayer::File,
                source: e,
            });
        }

        if failures.is_empty() {
            tracing::debug!("closed tar.gz archive");
            Ok(())
        } else {
            Err(ArchiveError::Close { failures })
        }
    }
}
