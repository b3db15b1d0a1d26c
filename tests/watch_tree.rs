// tests/watch_tree.rs

mod common;
use crate::common::{eventually, init_tracing, records, with_timeout, ExecRecord, FakeExecutor};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::mpsc;

use watchrun::engine::{CoreRuntime, RunOutcome, Runtime, RuntimeEvent, RuntimeOptions};
use watchrun::watch::{spawn_watcher, ExcludeFilter};

/// Wait for a change whose path ends with `suffix`, returning every change
/// seen on the way (including the match).
async fn changes_until(rx: &mut mpsc::Receiver<RuntimeEvent>, suffix: &str) -> Vec<PathBuf> {
    with_timeout(async {
        let mut seen = Vec::new();
        loop {
            match rx.recv().await {
                Some(RuntimeEvent::Changed(change)) => {
                    let done = change.path.ends_with(suffix);
                    seen.push(change.path);
                    if done {
                        return seen;
                    }
                }
                Some(other) => panic!("unexpected event {other:?}"),
                None => panic!("watcher stopped"),
            }
        }
    })
    .await
}

fn root_of(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().canonicalize().unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn new_subdirectories_are_watched_transitively() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = root_of(&dir);
    let (tx, mut rx) = mpsc::channel(64);
    let _watcher = spawn_watcher(&root, ExcludeFilter::none(), tx).unwrap();

    fs::create_dir(root.join("pkg")).unwrap();
    changes_until(&mut rx, "pkg").await;

    fs::create_dir(root.join("pkg").join("inner")).unwrap();
    changes_until(&mut rx, "inner").await;

    fs::write(root.join("pkg").join("inner").join("a.go"), "package inner\n").unwrap();
    let seen = changes_until(&mut rx, "a.go").await;
    assert!(seen.last().unwrap().starts_with(&root));
}

#[tokio::test(flavor = "multi_thread")]
async fn excluded_paths_never_produce_changes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = root_of(&dir);
    fs::create_dir(root.join(".git")).unwrap();
    let (tx, mut rx) = mpsc::channel(64);
    let _watcher = spawn_watcher(&root, ExcludeFilter::new(r"\.git").unwrap(), tx).unwrap();

    fs::write(root.join(".git").join("x"), "ref\n").unwrap();
    fs::write(root.join("ignored.git"), "").unwrap();
    fs::write(root.join("seen.txt"), "hello\n").unwrap();

    let seen = changes_until(&mut rx, "seen.txt").await;
    assert!(
        seen.iter().all(|p| !p.to_string_lossy().contains(".git")),
        "excluded path leaked: {seen:?}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_the_root_does_not_stop_the_watcher() {
    init_tracing();
    let parent = tempfile::tempdir().unwrap();
    let root = root_of(&parent).join("proj");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("main.go"), "package main\n").unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let watcher = spawn_watcher(&root, ExcludeFilter::none(), tx).unwrap();
    assert_eq!(watcher.root(), root.as_path());

    fs::remove_dir_all(&root).unwrap();
    // Any changes for the vanished tree resolve against an existing ancestor.
    tokio::time::sleep(Duration::from_millis(200)).await;
    while let Ok(event) = rx.try_recv() {
        if let RuntimeEvent::Changed(change) = event {
            assert!(change.path.starts_with(Path::new(&root)));
        }
    }
    assert!(watcher.is_running());
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn exclusion_ignores_directories_above_the_root() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let base = root_of(&dir);
    let root = base.join("build").join("proj");
    fs::create_dir_all(root.join("build")).unwrap();
    // Reach the tree through a link so the given root has no `build` in it.
    let link = base.join("link");
    std::os::unix::fs::symlink(&root, &link).unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let _watcher = spawn_watcher(&link, ExcludeFilter::new("build").unwrap(), tx).unwrap();

    fs::write(root.join("build").join("out.o"), "").unwrap();
    fs::write(root.join("main.go"), "package main\n").unwrap();

    let seen = changes_until(&mut rx, "main.go").await;
    assert!(
        seen.iter().all(|p| !p.starts_with(root.join("build"))),
        "excluded path leaked: {seen:?}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn watched_changes_drive_one_debounced_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = root_of(&dir);
    fs::create_dir(root.join(".git")).unwrap();
    fs::create_dir(root.join("src")).unwrap();

    let (tx, rx) = mpsc::channel(64);
    let _watcher = spawn_watcher(&root, ExcludeFilter::new(r"\.git").unwrap(), tx.clone()).unwrap();

    let log = FakeExecutor::new_log();
    let executor =
        FakeExecutor::new(tx.clone(), log.clone()).completes_with(RunOutcome::Exited(0));
    let core = CoreRuntime::new(RuntimeOptions::default(), SystemTime::now());
    let runtime = tokio::spawn(Runtime::new(core, rx, executor).run());

    eventually(|| records(&log) == vec![ExecRecord::Started(1)]).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    fs::write(root.join(".git").join("index"), "x").unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(records(&log).len(), 1, "excluded write triggered a run");

    fs::write(root.join("src").join("a.go"), "package a\n").unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let last_write = Instant::now();
    fs::write(root.join("src").join("a.go"), "package a // edited\n").unwrap();

    eventually(|| records(&log).len() == 2).await;
    assert!(
        last_write.elapsed() >= RuntimeOptions::default().debounce,
        "run started {:?} after the last write",
        last_write.elapsed()
    );

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(
        records(&log),
        vec![ExecRecord::Started(1), ExecRecord::Started(2)]
    );

    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    with_timeout(runtime).await.unwrap().unwrap();
}
