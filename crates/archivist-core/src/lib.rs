//! Archive building for zip and tar.gz.
//!
//! `archivist-core` writes a single archive in one pass from files,
//! directory trees and in-memory content, behind one [`ArchiveWriter`]
//! contract. Sources can be symlink-resolved and filtered by an exclude
//! list; finished archives are described by their size, MD5 and SHA-256.
//!
//! # Examples
//!
//! ```no_run
//! use archivist_core::ArchiveResult;
//! use archivist_core::ArchiveSettings;
//! use archivist_core::create_writer;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = create_writer("tar.gz").ok_or("unsupported format")?;
//! let settings = ArchiveSettings::default()
//!     .with_resolve_symlinks(true)
//!     .with_exclude_list(vec!["app/.env".into()]);
//!
//! writer.open(Path::new("app.tar.gz"), settings)?;
//! let report = writer.add_dir(Path::new("app"), "app")?;
//! writer.add_content(b"release\n", "app/CHANNEL")?;
//! writer.close()?;
//!
//! let result = ArchiveResult::compute("app.tar.gz")?;
//! println!("{} files, {} bytes", report.files_added, result.size);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod checksum;
pub mod error;
pub mod format;
pub mod paths;
pub mod plan;
pub mod settings;
pub mod walker;
pub mod writer;

pub use checksum::ArchiveResult;
pub use checksum::Checksums;
pub use error::ArchiveError;
pub use error::CloseFailure;
pub use error::CloseLayer;
pub use error::Result;
pub use format::ArchiveFormat;
pub use format::create_writer;
pub use plan::ArchivePlan;
pub use plan::BuildReport;
pub use settings::ArchiveSettings;
pub use walker::WalkFailure;
pub use walker::WalkReport;
pub use writer::ArchiveWriter;
pub use writer::EntryOutcome;
pub use writer::TarGzArchiveWriter;
pub use writer::ZipArchiveWriter;
