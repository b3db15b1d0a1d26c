// src/watch/registry.rs

//! The watch registry: which paths the OS is asked to watch.
//!
//! The backend is asked to watch single directories (non-recursively); the
//! registry walks the tree itself so it can apply the exclusion filter and
//! re-register directories that appear later.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::{is_not_found, FileSystem};
use crate::watch::exclude::ExcludeFilter;

/// Something that can be asked to watch one path.
pub trait WatchBackend: Send {
    fn add(&mut self, path: &Path) -> notify::Result<()>;
}

/// Production backend backed by `notify`'s platform watcher.
pub struct NotifyBackend {
    watcher: RecommendedWatcher,
}

impl NotifyBackend {
    pub fn new(watcher: RecommendedWatcher) -> Self {
        Self { watcher }
    }
}

impl std::fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend").finish()
    }
}

impl WatchBackend for NotifyBackend {
    fn add(&mut self, path: &Path) -> notify::Result<()> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)
    }
}

/// `true` if notify says the path is gone.
pub fn is_missing(err: &notify::Error) -> bool {
    match &err.kind {
        notify::ErrorKind::PathNotFound => true,
        notify::ErrorKind::Io(io) => is_not_found(io),
        _ => false,
    }
}

/// Maintains the watch set for one tree.
pub struct WatchRegistry<B: WatchBackend> {
    backend: B,
    fs: Arc<dyn FileSystem>,
    exclude: ExcludeFilter,
    watched: BTreeSet<PathBuf>,
}

impl<B: WatchBackend> WatchRegistry<B> {
    pub fn new(backend: B, fs: Arc<dyn FileSystem>, exclude: ExcludeFilter) -> Self {
        Self {
            backend,
            fs,
            exclude,
            watched: BTreeSet::new(),
        }
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn exclude(&self) -> &ExcludeFilter {
        &self.exclude
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Every path handed to the backend so far.
    pub fn watch_set(&self) -> &BTreeSet<PathBuf> {
        &self.watched
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    /// Register `root` and, if it is a directory, every directory below it.
    ///
    /// A missing `root` is not an error; nothing is watched. Returns the
    /// number of paths successfully handed to the backend. Only a failure to
    /// stat `root` itself is returned as an error; failures further down are
    /// logged and skipped.
    pub fn register_tree(&mut self, root: &Path) -> Result<usize> {
        let stat = match self.fs.stat(root) {
            Ok(stat) => stat,
            Err(err) if is_not_found(&err) => {
                debug!(path = ?root, "no longer exists; not watching");
                return Ok(0);
            }
            Err(err) => return Err(err.into()),
        };

        if !stat.is_dir {
            return Ok(usize::from(self.watch(root)));
        }

        let dirs = self.discover(root);
        let added = dirs.iter().filter(|dir| self.watch(dir)).count();
        Ok(added)
    }

    /// Collect `root` and all non-excluded directories below it.
    ///
    /// Uses an explicit worklist so deep trees cannot overflow the stack.
    /// Order is unspecified.
    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) if is_not_found(&err) => continue,
                Err(err) => {
                    warn!(path = ?dir, error = %err, "failed to list directory");
                    found.push(dir);
                    continue;
                }
            };

            for entry in entries {
                if self.exclude.is_excluded(&entry) {
                    debug!(path = ?entry, "excluding");
                    continue;
                }
                match self.fs.stat(&entry) {
                    Ok(stat) if stat.is_dir => pending.push(entry),
                    Ok(_) => {}
                    Err(err) if is_not_found(&err) => {}
                    Err(err) => warn!(path = ?entry, error = %err, "failed to watch"),
                }
            }

            found.push(dir);
        }

        found
    }

    fn watch(&mut self, path: &Path) -> bool {
        debug!(path = ?path, "watching");
        match self.backend.add(path) {
            Ok(()) => {
                self.watched.insert(path.to_path_buf());
                true
            }
            Err(err) if is_missing(&err) => {
                debug!(path = ?path, "no longer exists");
                false
            }
            Err(err) => {
                warn!(path = ?path, error = %err, "failed to watch");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::{at, MockFileSystem};

    #[derive(Default)]
    struct Recorder {
        added: Vec<PathBuf>,
        refuse: Vec<PathBuf>,
    }

    impl WatchBackend for Recorder {
        fn add(&mut self, path: &Path) -> notify::Result<()> {
            if self.refuse.iter().any(|p| p == path) {
                return Err(notify::Error::generic("permission denied"));
            }
            self.added.push(path.to_path_buf());
            Ok(())
        }
    }

    fn registry(fs: &MockFileSystem, exclude: &str) -> WatchRegistry<Recorder> {
        WatchRegistry::new(
            Recorder::default(),
            Arc::new(fs.clone()),
            ExcludeFilter::new(exclude).unwrap(),
        )
    }

    fn tree() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/main.go", at(1));
        fs.add_file("/proj/src/a.go", at(1));
        fs.add_file("/proj/src/deep/er/b.go", at(1));
        fs.add_file("/proj/.git/HEAD", at(1));
        fs
    }

    #[test]
    fn registers_every_directory_except_excluded_ones() {
        let fs = tree();
        let mut reg = registry(&fs, r"\.git");

        let added = reg.register_tree(Path::new("/proj")).unwrap();

        assert_eq!(added, 4);
        let expected: BTreeSet<PathBuf> = ["/proj", "/proj/src", "/proj/src/deep", "/proj/src/deep/er"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(reg.watch_set(), &expected);
    }

    #[test]
    fn missing_root_is_not_an_error() {
        let fs = MockFileSystem::new();
        let mut reg = registry(&fs, "");

        assert_eq!(reg.register_tree(Path::new("/gone")).unwrap(), 0);
        assert!(reg.watch_set().is_empty());
    }

    #[test]
    fn plain_file_root_registers_only_the_file() {
        let fs = tree();
        let mut reg = registry(&fs, "");

        assert_eq!(reg.register_tree(Path::new("/proj/main.go")).unwrap(), 1);
        assert_eq!(reg.backend().added, vec![PathBuf::from("/proj/main.go")]);
    }

    #[test]
    fn backend_failure_does_not_stop_siblings() {
        let fs = tree();
        let mut reg = registry(&fs, r"\.git");
        reg.backend.refuse.push(PathBuf::from("/proj/src/deep"));

        let added = reg.register_tree(Path::new("/proj")).unwrap();

        assert_eq!(added, 3);
        assert!(reg.is_watched(Path::new("/proj/src/deep/er")));
        assert!(!reg.is_watched(Path::new("/proj/src/deep")));
    }

    #[test]
    fn reregistering_refreshes_the_backend_without_growing_the_set() {
        let fs = tree();
        let mut reg = registry(&fs, r"\.git");
        reg.register_tree(Path::new("/proj/src")).unwrap();
        reg.register_tree(Path::new("/proj/src")).unwrap();

        assert_eq!(reg.watch_set().len(), 3);
        assert_eq!(reg.backend().added.len(), 6);
    }
}
