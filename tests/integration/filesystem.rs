use hotplate::{DirFileSystem, Engine, EngineError, EngineOptions, FileSystem};
use serde_json::json;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::sync::{Arc, RwLock};

use crate::common::sample_site;

/// A file system held in memory, editable while an engine reads from it.
#[derive(Debug, Default)]
struct MapFileSystem {
    files: RwLock<HashMap<String, String>>,
}

impl MapFileSystem {
    fn put(&self, path: &str, contents: &str) {
        self.files.write().unwrap().insert(path.to_string(), contents.to_string());
    }
}

impl FileSystem for MapFileSystem {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let path = path.trim_start_matches('/');
        match self.files.read().unwrap().get(path) {
            Some(contents) => Ok(Box::new(Cursor::new(contents.clone().into_bytes()))),
            None => Err(io::Error::new(io::ErrorKind::NotFound, path.to_string())),
        }
    }
}

#[derive(Debug)]
struct BrokenFileSystem;

impl FileSystem for BrokenFileSystem {
    fn open(&self, _path: &str) -> io::Result<Box<dyn Read + Send>> {
        Err(io::Error::other("offline"))
    }

    fn check(&self) -> io::Result<()> {
        Err(io::Error::other("offline"))
    }
}

#[test]
fn test_renders_through_caller_filesystem() {
    let fs = Arc::new(MapFileSystem::default());
    fs.put("index.html", "<h1>{{ Title }}</h1>");
    fs.put("layouts/main.tera", "<body>{{ slot() }}</body>");

    let engine = Engine::with_filesystem(fs.clone(), EngineOptions::default()).unwrap();
    let page = engine
        .render_to_string("index", json!({"Title": "Hi"}), Some("layouts/main"))
        .unwrap();
    assert_eq!(page, "<body><h1>Hi</h1></body>");

    // Lookups go straight to the file system.
    fs.put("index.html", "<h2>{{ Title }}</h2>");
    assert_eq!(engine.render_to_string("index", json!({"Title": "Hi"}), None).unwrap(), "<h2>Hi</h2>");
    assert!(!engine.is_watching());
}

#[test]
fn test_filesystem_store_cannot_list_names() {
    let fs = Arc::new(MapFileSystem::default());
    fs.put("index.html", "x");
    let engine = Engine::with_filesystem(fs, EngineOptions::default()).unwrap();

    assert!(engine.exists("index"));
    assert!(!engine.exists("other"));
    assert_eq!(engine.template_names().unwrap(), None);
}

#[test]
fn test_dir_filesystem_matches_in_memory_store() {
    let site = sample_site().unwrap();
    let binding = json!({"Section": "About", "Body": "Hi"});

    let memory = Engine::new(site.path(), EngineOptions::default()).unwrap();
    let passthrough =
        Engine::with_filesystem(Arc::new(DirFileSystem::new(site.path())), EngineOptions::default())
            .unwrap();

    assert_eq!(
        memory.render_to_string("pages/about", binding.clone(), Some("layouts/main")).unwrap(),
        passthrough.render_to_string("pages/about", binding, Some("layouts/main")).unwrap()
    );
}

#[test]
fn test_unusable_filesystem_fails_load() {
    let engine = Engine::with_filesystem(Arc::new(BrokenFileSystem), EngineOptions::default()).unwrap();
    assert!(matches!(engine.load(), Err(EngineError::FileSystemUnavailable { .. })));
    assert!(!engine.exists("index"));
}

#[test]
fn test_unrecognized_files_are_not_templates_on_either_backing() {
    let site = sample_site().unwrap();
    let memory = Engine::new(site.path(), EngineOptions::default()).unwrap();
    let passthrough =
        Engine::with_filesystem(Arc::new(DirFileSystem::new(site.path())), EngineOptions::default())
            .unwrap();

    for engine in [&memory, &passthrough] {
        assert!(!engine.exists("README.md"));
        assert!(matches!(
            engine.render_to_string("README.md", (), None),
            Err(EngineError::TemplateNotFound { .. })
        ));
    }
}

/// Refuses every open with a permission error.
#[derive(Debug)]
struct LockedFileSystem;

impl FileSystem for LockedFileSystem {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, path.to_string()))
    }
}

#[test]
fn test_open_failure_surfaces_as_read_error() {
    let engine = Engine::with_filesystem(Arc::new(LockedFileSystem), EngineOptions::default()).unwrap();

    match engine.render_to_string("index", (), None) {
        Err(EngineError::Read { path, .. }) => assert_eq!(path, "index.html"),
        other => panic!("expected Read error, got {other:?}"),
    }
    assert!(!engine.exists("index"));
}
