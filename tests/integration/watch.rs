//! Live watcher tests. These touch the real file system and wait for the
//! notification backend, so every assertion polls with a timeout.

use hotplate::{Engine, EngineOptions, StoreChange};
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::{CountingObserver, TemplateTree, WATCH_TIMEOUT, wait_until};

fn watching_engine(tree: &TemplateTree) -> (Engine, Arc<CountingObserver>, PathBuf) {
    hotplate::test_utils::init_test_logging(None);
    // Backends report canonical paths; temp dirs may sit behind a symlink.
    let root = tree.path().canonicalize().unwrap();
    let observer = Arc::new(CountingObserver::new());
    let engine = Engine::builder()
        .root(&root)
        .options(EngineOptions::default().with_reload(true))
        .observer(observer.clone())
        .build()
        .unwrap();
    engine.load().unwrap();
    assert!(engine.is_watching());
    (engine, observer, root)
}

#[test]
fn test_created_file_is_picked_up() {
    let tree = TemplateTree::with_files(&[("index.html", "home")]).unwrap();
    let (engine, observer, root) = watching_engine(&tree);
    assert!(!engine.exists("fresh"));

    tree.write("fresh.html", "new page").unwrap();

    assert!(wait_until(WATCH_TIMEOUT, || engine.exists("fresh")));
    assert!(wait_until(WATCH_TIMEOUT, || {
        observer.changes().contains(&StoreChange::Set {
            key: "fresh".into(),
            path: root.join("fresh.html"),
        })
    }));
}

#[test]
fn test_deleted_file_is_dropped() {
    let tree = TemplateTree::with_files(&[("index.html", "home"), ("old.html", "bye")]).unwrap();
    let (engine, observer, _) = watching_engine(&tree);
    assert!(engine.exists("old"));

    tree.remove("old.html").unwrap();

    assert!(wait_until(WATCH_TIMEOUT, || !engine.exists("old")));
    assert!(wait_until(WATCH_TIMEOUT, || {
        observer
            .changes()
            .iter()
            .any(|c| matches!(c, StoreChange::Deleted { key, .. } if key == "old"))
    }));
    assert!(engine.exists("index"));
}

#[test]
fn test_new_directory_is_subscribed() {
    let tree = TemplateTree::with_files(&[("index.html", "home")]).unwrap();
    let (engine, _, root) = watching_engine(&tree);

    tree.mkdir("blog").unwrap();
    assert!(wait_until(WATCH_TIMEOUT, || engine.watched_directories().contains(&root.join("blog"))));

    tree.write("blog/post.html", "post").unwrap();
    assert!(wait_until(WATCH_TIMEOUT, || engine.exists("blog/post")));
}

#[test]
fn test_removed_directory_is_unsubscribed() {
    let tree = TemplateTree::with_files(&[("index.html", "home"), ("docs/a.html", "a")]).unwrap();
    let (engine, _, root) = watching_engine(&tree);
    assert!(engine.watched_directories().contains(&root.join("docs")));

    tree.remove("docs").unwrap();

    assert!(wait_until(WATCH_TIMEOUT, || !engine.watched_directories().contains(&root.join("docs"))));
    assert!(engine.watched_directories().contains(&root));
}

#[test]
fn test_ignored_extension_does_not_touch_store() {
    let tree = TemplateTree::with_files(&[("index.html", "home")]).unwrap();
    let (engine, observer, _) = watching_engine(&tree);

    tree.write("notes.txt", "scratch").unwrap();
    tree.write("marker.html", "m").unwrap();

    assert!(wait_until(WATCH_TIMEOUT, || engine.exists("marker")));
    assert!(!engine.exists("notes"));
    assert!(observer.changes().iter().all(|c| c.key() != "notes"));
}

#[test]
fn test_dropping_engine_stops_watcher() {
    let tree = TemplateTree::with_files(&[("index.html", "home")]).unwrap();
    let (engine, observer, _) = watching_engine(&tree);
    drop(engine);

    tree.write("late.html", "late").unwrap();
    std::thread::sleep(std::time::Duration::from_millis(300));
    assert!(observer.changes().iter().all(|c| c.key() != "late"));
}
