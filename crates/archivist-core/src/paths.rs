//! Path resolution: symlinks, exclude lists and entry naming.
//!
//! Every function here is stateless. Exclude lists are normalized once, when
//! a writer is opened, so the per-entry check is a single hash lookup.

use crate::ArchiveError;
use crate::Result;
use std::collections::HashSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Returns the absolute, lexically clean form of `path`.
///
/// Relative paths are joined to the current working directory. `.` and
/// `..` components are folded without touching the filesystem, so the path
/// does not need to exist.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined or the
/// path is empty.
///
/// # Examples
///
/// ```
/// use archivist_core::paths::absolutize;
/// use std::path::Path;
///
/// let abs = absolutize(Path::new("/srv/app/../data/./file.txt"))?;
/// assert_eq!(abs, Path::new("/srv/data/file.txt"));
/// # Ok::<(), archivist_core::ArchiveError>(())
/// ```
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = std::path::absolute(path).map_err(|source| ArchiveError::ResolvePath {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_lexically(&joined))
}

/// Folds `.` and `..` components of an absolute path.
///
/// `..` at the root stays at the root, matching how the kernel resolves it.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
        }
    }
    out
}

/// Resolves a symbolic link to the absolute path of its target.
///
/// The path is inspected without following links. Non-symlinks are returned
/// unchanged.
///
/// Relative link targets are resolved against the directory that holds the
/// link, the way the kernel follows them, and not against the current
/// working directory. A link `a/b -> c` therefore resolves to `a/c` wherever
/// the process runs.
///
/// # Errors
///
/// Returns `ArchiveError::Symlink` if the path cannot be inspected or the
/// link cannot be read, and `ArchiveError::ResolvePath` if the target
/// cannot be made absolute.
pub fn resolve_symlink(path: &Path) -> Result<PathBuf> {
    let metadata = std::fs::symlink_metadata(path).map_err(|source| ArchiveError::Symlink {
        path: path.to_path_buf(),
        source,
    })?;

    if !metadata.file_type().is_symlink() {
        return Ok(path.to_path_buf());
    }

    let target = std::fs::read_link(path).map_err(|source| ArchiveError::Symlink {
        path: path.to_path_buf(),
        source,
    })?;

    let target = match path.parent() {
        Some(dir) if target.is_relative() => dir.join(target),
        _ => target,
    };

    absolutize(&target)
}

/// Maps every exclude entry to its absolute, clean form.
///
/// # Errors
///
/// Fails on the first entry that cannot be made absolute.
pub fn resolve_exclude_list<P: AsRef<Path>>(raw: &[P]) -> Result<Vec<PathBuf>> {
    raw.iter().map(|p| absolutize(p.as_ref())).collect()
}

/// A normalized set of paths that must never be written into an archive.
///
/// Matching is exact equality on absolute paths. There is no prefix or glob
/// matching: excluding a directory does not exclude the files inside it.
#[derive(Debug, Clone, Default)]
pub struct ExcludeList {
    paths: HashSet<PathBuf>,
}

impl ExcludeList {
    /// Builds an exclude list from caller-supplied paths.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry cannot be made absolute.
    ///
    /// # Examples
    ///
    /// ```
    /// use archivist_core::paths::ExcludeList;
    /// use std::path::Path;
    ///
    /// let list = ExcludeList::resolve(&["/tmp/a/../b.txt"])?;
    /// assert!(list.contains(Path::new("/tmp/b.txt")));
    /// assert!(!list.contains(Path::new("/tmp/a")));
    /// # Ok::<(), archivist_core::ArchiveError>(())
    /// ```
    pub fn resolve<P: AsRef<Path>>(raw: &[P]) -> Result<Self> {
        Ok(Self {
            paths: resolve_exclude_list(raw)?.into_iter().collect(),
        })
    }

    /// Returns `true` if `path` is excluded.
    ///
    /// `path` must already be absolute and clean.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Number of excluded paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Cleans a caller-supplied path into an archive-relative entry name.
///
/// The path is cleaned lexically and every leading `..` component is
/// dropped, so `../../data/file.txt` becomes `data/file.txt`. Absolute
/// paths keep their root.
///
/// # Examples
///
/// ```
/// use archivist_core::paths::clean_entry_path;
/// use std::path::Path;
///
/// assert_eq!(clean_entry_path(Path::new("../../data/./a.txt")), "data/a.txt");
/// assert_eq!(clean_entry_path(Path::new("./test.txt")), "test.txt");
/// assert_eq!(clean_entry_path(Path::new("/abs/x/../y")), "/abs/y");
/// ```
#[must_use]
pub fn clean_entry_path(path: &Path) -> String {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    let leading = parts
        .iter()
        .take_while(|c| matches!(c, Component::ParentDir))
        .count();
    let cleaned: PathBuf = parts[leading..].iter().collect();

    if cleaned.as_os_str().is_empty() {
        ".".to_string()
    } else {
        cleaned.to_string_lossy().into_owned()
    }
}

/// Computes the entry name of a file discovered while walking `root`.
///
/// `prefix` is searched for as a run of whole path components inside
/// `path`. The last match that lies within `root` wins; failing that, the
/// first match anywhere in `path`. The entry name is `path` from the start
/// of the match onward. Without a match (or with an empty prefix) the full
/// `path` is used.
///
/// # Examples
///
/// ```
/// use archivist_core::paths::destination_for;
/// use std::path::Path;
///
/// let root = Path::new("/home/dev/project/internal/testdata");
/// let file = Path::new("/home/dev/project/internal/testdata/sub/file.txt");
/// assert_eq!(
///     destination_for(file, root, "internal/testdata"),
///     "internal/testdata/sub/file.txt"
/// );
///
/// // "data" does not match inside "database"
/// let root = Path::new("/srv/database/data");
/// let file = Path::new("/srv/database/data/a.txt");
/// assert_eq!(destination_for(file, root, "data"), "data/a.txt");
///
/// // no match: the full path is kept
/// assert_eq!(destination_for(file, root, "other"), "/srv/database/data/a.txt");
/// ```
#[must_use]
pub fn destination_for(path: &Path, root: &Path, prefix: &str) -> String {
    let full = || path.to_string_lossy().into_owned();

    let needle: Vec<Component<'_>> = Path::new(prefix)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if needle.is_empty() {
        return full();
    }

    let hay: Vec<Component<'_>> = path.components().collect();
    if needle.len() > hay.len() {
        return full();
    }

    let root_len = root.components().count();
    let starts: Vec<usize> = (0..=hay.len() - needle.len())
        .filter(|&i| hay[i..i + needle.len()] == needle[..])
        .collect();

    let chosen = starts
        .iter()
        .rev()
        .find(|&&i| i + needle.len() <= root_len)
        .or_else(|| starts.first());

    chosen.map_or_else(full, |&i| {
        hay[i..]
            .iter()
            .collect::<PathBuf>()
            .to_string_lossy()
            .into_owned()
    })
}

/// Returns the base name of `path` as an entry name.
///
/// Used when flattening directory structure.
#[must_use]
pub fn flattened_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_absolutize_relative_uses_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let abs = absolutize(Path::new("some/rel/../file.txt")).unwrap();
        assert_eq!(abs, cwd.join("some/file.txt"));
    }

    #[test]
    fn test_absolutize_parent_at_root() {
        assert_eq!(
            absolutize(Path::new("/../etc/hosts")).unwrap(),
            Path::new("/etc/hosts")
        );
    }

    #[test]
    fn test_absolutize_empty_path_fails() {
        let err = absolutize(Path::new("")).unwrap_err();
        assert!(matches!(err, ArchiveError::ResolvePath { .. }));
    }

    #[test]
    fn test_resolve_symlink_passthrough() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        assert_eq!(resolve_symlink(&file).unwrap(), file);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_symlink_absolute_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target.txt");
        let link = temp.path().join("link.txt");
        fs::write(&target, "x").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(resolve_symlink(&link).unwrap(), target);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_symlink_relative_target() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        fs::write(temp.path().join("real/target.txt"), "x").unwrap();
        fs::create_dir(temp.path().join("links")).unwrap();
        let link = temp.path().join("links/link.txt");
        std::os::unix::fs::symlink("../real/target.txt", &link).unwrap();

        let resolved = resolve_symlink(&link).unwrap();
        assert_eq!(resolved, absolutize(&temp.path().join("real/target.txt")).unwrap());
    }

    #[test]
    fn test_resolve_symlink_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = resolve_symlink(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, ArchiveError::Symlink { .. }));
    }

    #[test]
    fn test_exclude_list_normalizes_entries() {
        let cwd = std::env::current_dir().unwrap();
        let list = ExcludeList::resolve(&["a/./b.txt", "/x/y/../z"]).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&cwd.join("a/b.txt")));
        assert!(list.contains(Path::new("/x/z")));
        assert!(!list.contains(Path::new("/x/y/z")));
    }

    #[test]
    fn test_exclude_list_rejects_empty_entry() {
        assert!(ExcludeList::resolve(&["ok.txt", ""]).is_err());
    }

    #[test]
    fn test_clean_entry_path() {
        assert_eq!(clean_entry_path(Path::new("a/b/../c")), "a/c");
        assert_eq!(clean_entry_path(Path::new("../../../x")), "x");
        assert_eq!(clean_entry_path(Path::new("a/../../x")), "x");
        assert_eq!(clean_entry_path(Path::new(".")), ".");
        assert_eq!(clean_entry_path(Path::new("/../x")), "/x");
    }

    #[test]
    fn test_destination_absolute_prefix_keeps_full_path() {
        let root = Path::new("/data/in");
        let file = Path::new("/data/in/a/b.txt");
        assert_eq!(destination_for(file, root, "/data/in"), "/data/in/a/b.txt");
    }

    #[test]
    fn test_destination_prefers_match_inside_root() {
        // the prefix also appears below the root; the root occurrence wins
        let root = Path::new("/srv/data");
        let file = Path::new("/srv/data/nested/data/f.txt");
        assert_eq!(destination_for(file, root, "data"), "data/nested/data/f.txt");
    }

    #[test]
    fn test_destination_falls_back_to_first_match() {
        let root = Path::new("/srv/root");
        let file = Path::new("/srv/root/x/cfg/f.txt");
        assert_eq!(destination_for(file, root, "cfg"), "cfg/f.txt");
    }

    #[test]
    fn test_destination_empty_prefix() {
        let file = Path::new("/srv/root/f.txt");
        assert_eq!(destination_for(file, Path::new("/srv/root"), ""), "/srv/root/f.txt");
        assert_eq!(destination_for(file, Path::new("/srv/root"), "."), "/srv/root/f.txt");
    }

    #[test]
    fn test_flattened_name() {
        assert_eq!(flattened_name(Path::new("/a/b/c.txt")), "c.txt");
        assert_eq!(flattened_name(Path::new("c.txt")), "c.txt");
    }
}
