//! Integrity metadata for finished archives.

use crate::ArchiveError;
use crate::Result;
use sha2::Digest;
use sha2::Sha256;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Lowercase hex digests of a byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksums {
    /// MD5 digest, 32 hex characters.
    pub md5: String,
    /// SHA-256 digest, 64 hex characters.
    pub sha256: String,
}

/// Size and digests of a closed archive file.
///
/// Only meaningful once the writer has been closed; computing it earlier
/// hashes a partially flushed file.
///
/// # Examples
///
/// ```no_run
/// use archivist_core::ArchiveResult;
///
/// let result = ArchiveResult::compute("out.zip")?;
/// println!("{} bytes, sha256 {}", result.size, result.sha256);
/// # Ok::<(), archivist_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveResult {
    /// SHA-256 digest of the archive, lowercase hex.
    pub sha256: String,
    /// MD5 digest of the archive, lowercase hex.
    pub md5: String,
    /// Archive size in bytes.
    pub size: u64,
}

impl ArchiveResult {
    /// Stats and hashes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'd or read.
    pub fn compute<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let size = size(path)?;
        let Checksums { md5, sha256 } = checksums(path)?;
        Ok(Self { sha256, md5, size })
    }
}

/// Computes MD5 and SHA-256 of a file in a single streaming pass.
///
/// # Errors
///
/// Returns `ArchiveError::ReadSource` if the file cannot be opened or read.
pub fn checksums<P: AsRef<Path>>(path: P) -> Result<Checksums> {
    let path = path.as_ref();
    let read_err = |source| ArchiveError::ReadSource {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(read_err)?;
    let mut md5 = md5::Context::new();
    let mut sha256 = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_err(e)),
        };
        md5.consume(&buffer[..n]);
        sha256.update(&buffer[..n]);
    }

    Ok(Checksums {
        md5: format!("{:x}", md5.compute()),
        sha256: hex::encode(sha256.finalize()),
    })
}

/// Computes MD5 and SHA-256 of an in-memory buffer.
///
/// # Examples
///
/// ```
/// use archivist_core::checksum::checksums_of;
///
/// let sums = checksums_of(b"");
/// assert_eq!(sums.md5, "d41d8cd98f00b204e9800998ecf8427e");
/// ```
#[must_use]
pub fn checksums_of(bytes: &[u8]) -> Checksums {
    Checksums {
        md5: format!("{:x}", md5::compute(bytes)),
        sha256: hex::encode(Sha256::digest(bytes)),
    }
}

/// Returns the size of the file at `path` in bytes.
///
/// # Errors
///
/// Returns `ArchiveError::ReadSource` if the path cannot be stat'd.
pub fn size<P: AsRef<Path>>(path: P) -> Result<u64> {
    let path = path.as_ref();
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| ArchiveError::ReadSource {
            path: path.to_path_buf(),
            source,
        })
}
