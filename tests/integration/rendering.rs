use hotplate::{Engine, EngineError, EngineOptions, ErrorOrigin, LoadState, SlotErrorPolicy};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::{CountingObserver, TemplateTree, sample_site};

#[test]
fn test_render_hello_world() {
    let site = sample_site().unwrap();
    let engine = Engine::new(site.path(), EngineOptions::default()).unwrap();

    let page = engine
        .render_to_string("index", json!({"Title": "Hello, World!"}), None)
        .unwrap();
    assert_eq!(page, "<h1>Hello, World!</h1>");
}

#[test]
fn test_render_before_load_loads_lazily() {
    let site = sample_site().unwrap();
    let engine = Engine::new(site.path(), EngineOptions::default()).unwrap();
    assert_eq!(engine.load_state(), LoadState::Unloaded);

    let mut out = Vec::new();
    engine.render(&mut out, "index", json!({"Title": "x"}), None).unwrap();
    assert_eq!(engine.load_state(), LoadState::Loaded);
    assert_eq!(out, b"<h1>x</h1>");
}

#[test]
fn test_layout_wraps_content() {
    let site = sample_site().unwrap();
    let engine = Engine::new(site.path(), EngineOptions::default()).unwrap();

    let binding: HashMap<&str, &str> = [("Section", "About"), ("Body", "Hi")].into();
    let direct = engine.render_to_string("pages/about", binding.clone(), None).unwrap();
    let wrapped = engine
        .render_to_string("pages/about", binding, Some("layouts/main"))
        .unwrap();

    assert_eq!(direct, "<nav>About</nav><p>Hi</p>");
    assert_eq!(wrapped, format!("<body>{direct}</body>"));
}

#[test]
fn test_empty_layout_renders_directly() {
    let site = sample_site().unwrap();
    let engine = Engine::new(site.path(), EngineOptions::default()).unwrap();

    let page = engine.render_to_string("index", json!({"Title": "t"}), Some("")).unwrap();
    assert_eq!(page, "<h1>t</h1>");
}

#[test]
fn test_template_names_skip_unrecognized_files() {
    let site = sample_site().unwrap();
    let engine = Engine::new(site.path(), EngineOptions::default()).unwrap();

    let names = engine.template_names().unwrap().unwrap();
    assert_eq!(names, vec!["index", "layouts/main", "pages/about", "partials/nav"]);
    assert!(engine.exists("pages/about"));
    assert!(engine.exists("/pages/about.tera"));
    assert!(!engine.exists("README"));
}

#[test]
fn test_missing_template_is_reported() {
    let site = sample_site().unwrap();
    let engine = Engine::new(site.path(), EngineOptions::default()).unwrap();

    match engine.render_to_string("indx", (), None) {
        Err(EngineError::TemplateNotFound { name, suggestions }) => {
            assert_eq!(name, "indx");
            assert!(suggestions.contains(&"index".to_string()));
        }
        other => panic!("expected TemplateNotFound, got {other:?}"),
    }
}

#[test]
fn test_custom_delimiters() {
    let tree = TemplateTree::with_files(&[
        ("page.html", "[[ Title ]] {{ raw }}"),
        ("shell.html", "<main>[[ slot() ]]</main>"),
    ])
    .unwrap();
    let options = EngineOptions::default().with_delimiters("[[", "]]");
    let engine = Engine::new(tree.path(), options).unwrap();

    let page = engine
        .render_to_string("page", json!({"Title": "Home"}), Some("shell"))
        .unwrap();
    assert_eq!(page, "<main>Home {{ raw }}</main>");
}

#[test]
fn test_slot_errors_swallowed_and_counted() {
    let tree = TemplateTree::with_files(&[
        ("broken.html", "{{ missing.field }}"),
        ("layout.html", "[{{ slot() }}]"),
    ])
    .unwrap();
    let observer = Arc::new(CountingObserver::new());
    let engine = Engine::builder()
        .root(tree.path())
        .observer(observer.clone())
        .build()
        .unwrap();

    assert_eq!(engine.render_to_string("broken", (), Some("layout")).unwrap(), "[]");
    assert_eq!(engine.render_to_string("broken", (), Some("layout")).unwrap(), "[]");
    assert_eq!(observer.swallowed_count(ErrorOrigin::Slot), 2);

    assert!(matches!(
        engine.render_to_string("broken", (), None),
        Err(EngineError::Render { .. })
    ));
}

#[test]
fn test_slot_errors_propagated() {
    let tree = TemplateTree::with_files(&[
        ("broken.html", "{{ missing.field }}"),
        ("layout.html", "[{{ slot() }}]"),
    ])
    .unwrap();
    let options = EngineOptions::default().with_slot_errors(SlotErrorPolicy::Propagate);
    let engine = Engine::new(tree.path(), options).unwrap();

    let err = engine.render_to_string("broken", (), Some("layout")).unwrap_err();
    assert!(matches!(err, EngineError::Render { ref name, .. } if name == "layout"));
}

#[test]
fn test_reload_picks_up_edits_without_watcher_events() {
    let tree = TemplateTree::with_files(&[("page.html", "one")]).unwrap();
    let options = EngineOptions::default().with_reload(true);
    let engine = Engine::new(tree.path(), options).unwrap();

    assert_eq!(engine.render_to_string("page", (), None).unwrap(), "one");
    tree.write("page.html", "two").unwrap();
    assert_eq!(engine.render_to_string("page", (), None).unwrap(), "two");
}

#[test]
fn test_without_reload_store_is_fixed_after_load() {
    let tree = TemplateTree::with_files(&[("page.html", "one")]).unwrap();
    let engine = Engine::new(tree.path(), EngineOptions::default()).unwrap();

    assert_eq!(engine.render_to_string("page", (), None).unwrap(), "one");
    tree.write("page.html", "two").unwrap();
    assert_eq!(engine.render_to_string("page", (), None).unwrap(), "one");
    assert!(!engine.is_watching());
}
