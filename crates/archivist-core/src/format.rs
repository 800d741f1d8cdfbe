//! Supported archive formats and writer construction.

use crate::ArchiveError;
use crate::ArchiveWriter;
use crate::TarGzArchiveWriter;
use crate::ZipArchiveWriter;
use std::fmt;
use std::str::FromStr;

/// Archive container format.
///
/// Identified by the case-sensitive names `"zip"` and `"tar.gz"`.
///
/// # Examples
///
/// ```
/// use archivist_core::ArchiveFormat;
///
/// let format: ArchiveFormat = "tar.gz".parse()?;
/// assert_eq!(format, ArchiveFormat::TarGz);
/// assert_eq!(format.to_string(), "tar.gz");
/// assert!("ZIP".parse::<ArchiveFormat>().is_err());
/// # Ok::<(), archivist_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// ZIP container with deflate compression.
    Zip,
    /// Tar stream wrapped in gzip.
    TarGz,
}

impl ArchiveFormat {
    /// Every supported format.
    pub const ALL: [Self; 2] = [Self::Zip, Self::TarGz];

    /// Looks up a format by its exact name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "zip" => Some(Self::Zip),
            "tar.gz" => Some(Self::TarGz),
            _ => None,
        }
    }

    /// Returns the format's name, which is also its usual file extension.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }

    /// Returns a fresh, unopened writer for this format.
    #[must_use]
    pub fn writer(self) -> Box<dyn ArchiveWriter> {
        match self {
            Self::Zip => Box::new(ZipArchiveWriter::new()),
            Self::TarGz => Box::new(TarGzArchiveWriter::new()),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ArchiveError::UnsupportedFormat {
            name: s.to_string(),
        })
    }
}

/// Returns a fresh, unopened writer for the format named `name`.
///
/// Unknown names, including differently cased ones, yield `None`.
///
/// # Examples
///
/// ```
/// use archivist_core::ArchiveFormat;
/// use archivist_core::create_writer;
///
/// let writer = create_writer("zip").unwrap();
/// assert_eq!(writer.format(), ArchiveFormat::Zip);
/// assert!(create_writer("rar").is_none());
/// ```
#[must_use]
pub fn create_writer(name: &str) -> Option<Box<dyn ArchiveWriter>> {
    ArchiveFormat::from_name(name).map(ArchiveFormat::writer)
}
