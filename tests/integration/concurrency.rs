use hotplate::{Engine, EngineOptions, LoadState};
use serde_json::json;
use std::thread;

use crate::common::TemplateTree;

#[test]
fn test_concurrent_first_load() {
    let files: Vec<(String, String)> =
        (0..50).map(|i| (format!("t/{i:02}.html"), format!("{i}:{{{{ v }}}}"))).collect();
    let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let tree = TemplateTree::with_files(&refs).unwrap();
    let engine = Engine::new(tree.path(), EngineOptions::default()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let engine = engine.clone();
            thread::spawn(move || {
                engine.load().unwrap();
                let name = format!("t/{:02}", worker * 6);
                engine.render_to_string(&name, json!({"v": worker}), None).unwrap()
            })
        })
        .collect();

    for (worker, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("{}:{worker}", worker * 6));
    }
    assert_eq!(engine.load_state(), LoadState::Loaded);
    assert_eq!(engine.template_names().unwrap().unwrap().len(), 50);
}

#[test]
fn test_concurrent_renders_with_reload() {
    let tree = TemplateTree::with_files(&[
        ("page.html", "{{ n }}"),
        ("layout.html", "<{{ slot() }}>"),
    ])
    .unwrap();
    let engine = Engine::new(tree.path(), EngineOptions::default().with_reload(true)).unwrap();

    thread::scope(|scope| {
        for n in 0..4 {
            let engine = &engine;
            scope.spawn(move || {
                for _ in 0..10 {
                    let page = engine
                        .render_to_string("page", json!({"n": n}), Some("layout"))
                        .unwrap();
                    assert_eq!(page, format!("<{n}>"));
                }
            });
        }
    });
}
