// src/fs/mock.rs

use super::{FileStat, FileSystem};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
enum MockEntry {
    File { modified: SystemTime },
    Dir { modified: SystemTime },
}

/// In-memory filesystem for tests.
///
/// Paths are used verbatim (no canonicalisation); tests are expected to use
/// absolute paths such as `/proj/src/a.go`. Creating an entry implicitly
/// creates its missing ancestors. Clones share the same tree.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.add_dir("/", at(0));
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let path = path.as_ref();
        ensure_parents(&mut entries, path, modified);
        entries.insert(path.to_path_buf(), MockEntry::File { modified });
    }

    pub fn add_dir(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let path = path.as_ref();
        ensure_parents(&mut entries, path, modified);
        entries.insert(path.to_path_buf(), MockEntry::Dir { modified });
    }

    /// Remove `path` and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|p, _| !p.starts_with(path));
    }
}

/// A fixed point in time, `secs` seconds after the epoch. Handy for tests.
pub fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

fn ensure_parents(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path, modified: SystemTime) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir { modified });
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(path) {
            Some(MockEntry::File { modified }) => Ok(FileStat {
                is_dir: false,
                modified: *modified,
            }),
            Some(MockEntry::Dir { modified }) => Ok(FileStat {
                is_dir: true,
                modified: *modified,
            }),
            None => Err(not_found(path)),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(path) {
            Some(MockEntry::Dir { .. }) => Ok(entries
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            Some(MockEntry::File { .. }) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is not a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }
}
