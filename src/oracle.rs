use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// What a metadata lookup tells us about a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathInfo {
    pub is_dir: bool,
    /// Allocated storage in 1 KiB blocks.
    pub blocks: u64,
}

/// Metadata and directory listing for the tree being measured.
///
/// `query` must not follow symbolic links, and `list` must never yield the
/// `.` and `..` pseudo-entries. Dropping the returned iterator closes the
/// listing.
pub trait Filesystem: Sync {
    type Entries: Iterator<Item = io::Result<OsString>>;

    fn query(&self, path: &Path) -> io::Result<PathInfo>;

    fn list(&self, path: &Path) -> io::Result<Self::Entries>;
}

/// The real filesystem, via `lstat` and `readdir`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    type Entries = EntryNames;

    fn query(&self, path: &Path) -> io::Result<PathInfo> {
        let metadata = fs::symlink_metadata(path)?;
        Ok(PathInfo {
            is_dir: metadata.is_dir(),
            blocks: blocks_of(&metadata),
        })
    }

    fn list(&self, path: &Path) -> io::Result<EntryNames> {
        Ok(EntryNames(fs::read_dir(path)?))
    }
}

/// Entry names of an open directory.
#[derive(Debug)]
pub struct EntryNames(fs::ReadDir);

impl Iterator for EntryNames {
    type Item = io::Result<OsString>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0
            .next()
            .map(|entry| entry.map(|entry| entry.file_name()))
    }
}

/// Native 512-byte blocks reported in 1 KiB units, the way `du` prints them.
#[cfg(unix)]
pub fn blocks_of(metadata: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.blocks() / 2
}

#[cfg(not(unix))]
pub fn blocks_of(metadata: &fs::Metadata) -> u64 {
    metadata.len().div_ceil(1024)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn listing_skips_dot_entries() -> io::Result<()> {
        let tmp_dir = TempDir::new()?;
        fs::write(tmp_dir.path().join("a"), b"a")?;
        fs::create_dir(tmp_dir.path().join("b"))?;

        let mut names = LocalFilesystem
            .list(tmp_dir.path())?
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();
        assert_eq!(names, vec![OsString::from("a"), OsString::from("b")]);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn symlinks_are_not_followed() -> io::Result<()> {
        let tmp_dir = TempDir::new()?;
        let target = tmp_dir.path().join("target");
        let link = tmp_dir.path().join("link");
        fs::create_dir(&target)?;
        std::os::unix::fs::symlink(&target, &link)?;

        assert!(LocalFilesystem.query(&target)?.is_dir);
        assert!(!LocalFilesystem.query(&link)?.is_dir);
        Ok(())
    }
}
