use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::{TemplateTree, run_hotplate, sample_site};

fn hotplate(dir: &TemplateTree) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_hotplate"));
    cmd.current_dir(dir.path()).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_list_text() {
    let site = sample_site().unwrap();
    hotplate(&site)
        .args(["list", "."])
        .assert()
        .success()
        .stdout("index\nlayouts/main\npages/about\npartials/nav\n");
}

#[test]
fn test_list_json() {
    let site = sample_site().unwrap();
    let output = run_hotplate(site.path(), &["list", ".", "--format", "json"]).unwrap();
    output.assert_success();

    let names: Vec<String> = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(names, vec!["index", "layouts/main", "pages/about", "partials/nav"]);
}

#[test]
fn test_list_with_extension_flag() {
    let site = sample_site().unwrap();
    hotplate(&site)
        .args(["list", ".", "--ext", ".md"])
        .assert()
        .success()
        .stdout("README\n");
}

#[test]
fn test_render_with_vars() {
    let site = sample_site().unwrap();
    hotplate(&site)
        .args(["render", ".", "index", "--var", "Title=Hello, World!"])
        .assert()
        .success()
        .stdout("<h1>Hello, World!</h1>");
}

#[test]
fn test_render_with_layout_and_data_file() {
    let site = sample_site().unwrap();
    site.write("about.toml", "Section = \"About\"\nBody = \"Hi\"\n").unwrap();

    hotplate(&site)
        .args(["render", ".", "pages/about", "--layout", "layouts/main", "--data", "about.toml"])
        .assert()
        .success()
        .stdout("<body><nav>About</nav><p>Hi</p></body>");
}

#[test]
fn test_render_with_custom_delimiters() {
    let tree = TemplateTree::with_files(&[("page.html", "<<Title>>")]).unwrap();
    hotplate(&tree)
        .args(["--delims", "<<,>>", "render", ".", "page", "--var", "Title=x"])
        .assert()
        .success()
        .stdout("x");
}

#[test]
fn test_render_missing_template_suggests() {
    let site = sample_site().unwrap();
    hotplate(&site)
        .args(["render", ".", "indx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("Did you mean: index"));
}

#[test]
fn test_render_missing_root() {
    let tree = TemplateTree::new().unwrap();
    run_hotplate(tree.path(), &["render", "nowhere", "index"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("Check that the template directory exists");
}

#[test]
fn test_render_unbound_variable_fails() {
    let site = sample_site().unwrap();
    hotplate(&site)
        .args(["render", ".", "index"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to render"));
}

#[test]
fn test_invalid_var_rejected_by_parser() {
    let site = sample_site().unwrap();
    hotplate(&site)
        .args(["render", ".", "index", "--var", "Title"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected KEY=VALUE"));
}
