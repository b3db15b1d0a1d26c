// src/watch/normalizer.rs

//! Turns raw `notify` events into [`ChangeEvent`]s.
//!
//! For every path in a notification:
//! 1. excluded paths are dropped (debug-logged only);
//! 2. the modification time is resolved, walking up to the nearest existing
//!    ancestor when the path itself is gone;
//! 3. newly created (or moved-in) directories are registered with the watch
//!    registry, subtree included;
//! 4. a `ChangeEvent` is emitted.
//!
//! Events are handled one at a time in arrival order. Batching is the
//! debounce scheduler's job.

use std::path::Path;
use std::time::SystemTime;

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::Event;
use tracing::{debug, warn};

use crate::engine::ChangeEvent;
use crate::errors::{Result, WatchrunError};
use crate::fs::{is_not_found, FileSystem};
use crate::watch::registry::{WatchBackend, WatchRegistry};

pub struct EventNormalizer<B: WatchBackend> {
    registry: WatchRegistry<B>,
}

impl<B: WatchBackend> EventNormalizer<B> {
    pub fn new(registry: WatchRegistry<B>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &WatchRegistry<B> {
        &self.registry
    }

    /// Normalize one notification. Multi-path notifications (rename from/to)
    /// yield one change per surviving path, in order.
    pub fn normalize(&mut self, event: &Event) -> Vec<ChangeEvent> {
        if matches!(event.kind, EventKind::Access(_)) {
            return Vec::new();
        }

        let created = is_creation(&event.kind);
        event
            .paths
            .iter()
            .filter_map(|path| self.normalize_path(path, created))
            .collect()
    }

    /// Normalize a single path. Returns `None` when the path is excluded or
    /// its time cannot be resolved.
    pub fn normalize_path(&mut self, path: &Path, created: bool) -> Option<ChangeEvent> {
        if self.registry.exclude().is_excluded(path) {
            debug!(path = ?path, "ignoring excluded path");
            return None;
        }

        let time = match resolve_mod_time(self.registry.fs().as_ref(), path) {
            Ok(time) => time,
            Err(err) => {
                warn!(path = ?path, error = %err, "dropping change");
                return None;
            }
        };

        if created {
            self.register_if_dir(path);
        }

        debug!(path = ?path, "change");
        Some(ChangeEvent {
            path: path.to_path_buf(),
            time,
        })
    }

    fn register_if_dir(&mut self, path: &Path) {
        match self.registry.fs().stat(path) {
            Ok(stat) if stat.is_dir => {
                if let Err(err) = self.registry.register_tree(path) {
                    warn!(path = ?path, error = %err, "failed to watch new directory");
                }
            }
            Ok(_) => {}
            Err(err) if is_not_found(&err) => {}
            Err(err) => warn!(path = ?path, error = %err, "failed to stat new path"),
        }
    }
}

/// Creation, or a rename that moved something into place.
fn is_creation(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both))
    )
}

/// Modification time of `path`, or of its nearest existing ancestor if the
/// path has vanished.
pub fn resolve_mod_time(fs: &dyn FileSystem, path: &Path) -> Result<SystemTime> {
    let mut current = path;
    loop {
        match fs.stat(current) {
            Ok(stat) => return Ok(stat.modified),
            Err(err) if is_not_found(&err) => match current.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => current = parent,
                _ => return Err(WatchrunError::Resolution(path.to_path_buf())),
            },
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::{at, MockFileSystem};
    use crate::watch::exclude::ExcludeFilter;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};
    use std::path::PathBuf;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        added: Vec<PathBuf>,
    }

    impl WatchBackend for Recorder {
        fn add(&mut self, path: &Path) -> notify::Result<()> {
            self.added.push(path.to_path_buf());
            Ok(())
        }
    }

    fn normalizer(fs: &MockFileSystem) -> EventNormalizer<Recorder> {
        let mut registry = WatchRegistry::new(
            Recorder::default(),
            Arc::new(fs.clone()),
            ExcludeFilter::new(r"\.git").unwrap(),
        );
        registry.register_tree(Path::new("/proj")).unwrap();
        EventNormalizer::new(registry)
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    fn project() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/main.go", at(10));
        fs.add_dir("/proj/src", at(10));
        fs
    }

    #[test]
    fn excluded_path_never_produces_a_change() {
        let fs = project();
        fs.add_file("/proj/.git/x", at(20));
        let mut n = normalizer(&fs);

        let changes = n.normalize(&event(EventKind::Create(CreateKind::File), "/proj/.git/x"));
        assert!(changes.is_empty());
    }

    #[test]
    fn modified_file_reports_its_own_mtime() {
        let fs = project();
        fs.add_file("/proj/src/a.go", at(30));
        let mut n = normalizer(&fs);

        let changes = n.normalize(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "/proj/src/a.go",
        ));
        assert_eq!(
            changes,
            vec![ChangeEvent {
                path: PathBuf::from("/proj/src/a.go"),
                time: at(30)
            }]
        );
    }

    #[test]
    fn deleted_path_resolves_to_nearest_existing_ancestor() {
        let fs = project();
        let mut n = normalizer(&fs);

        let changes = n.normalize(&event(
            EventKind::Remove(RemoveKind::File),
            "/proj/src/gone/deeper/a.go",
        ));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].time, at(10));
    }

    #[test]
    fn created_directory_is_registered_with_its_subtree() {
        let fs = project();
        let mut n = normalizer(&fs);
        fs.add_file("/proj/src/pkg/inner/b.go", at(40));

        n.normalize(&event(EventKind::Create(CreateKind::Folder), "/proj/src/pkg"));

        assert!(n.registry().is_watched(Path::new("/proj/src/pkg")));
        assert!(n.registry().is_watched(Path::new("/proj/src/pkg/inner")));
    }

    #[test]
    fn moved_in_directory_is_registered() {
        let fs = project();
        let mut n = normalizer(&fs);
        fs.add_dir("/proj/vendor", at(50));

        n.normalize(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            "/proj/vendor",
        ));
        assert!(n.registry().is_watched(Path::new("/proj/vendor")));
    }

    #[test]
    fn access_events_are_ignored() {
        let fs = project();
        let mut n = normalizer(&fs);

        let changes = n.normalize(&event(EventKind::Access(AccessKind::Any), "/proj/main.go"));
        assert!(changes.is_empty());
    }

    #[test]
    fn rename_pairs_yield_one_change_per_path() {
        let fs = project();
        fs.add_file("/proj/src/new.go", at(60));
        let mut n = normalizer(&fs);

        let rename = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/proj/src/old.go"))
            .add_path(PathBuf::from("/proj/src/new.go"));
        let paths: Vec<PathBuf> = n.normalize(&rename).into_iter().map(|c| c.path).collect();

        assert_eq!(
            paths,
            vec![PathBuf::from("/proj/src/old.go"), PathBuf::from("/proj/src/new.go")]
        );
    }

    #[test]
    fn relative_path_with_no_existing_ancestor_fails_to_resolve() {
        let fs = MockFileSystem::new();
        let err = resolve_mod_time(&fs, Path::new("nowhere/file")).unwrap_err();
        assert!(matches!(err, WatchrunError::Resolution(_)));
    }
}
