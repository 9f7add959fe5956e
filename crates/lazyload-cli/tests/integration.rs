#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const MANIFEST: &str = "\
name: Shop
mode: build
packages:
  - name: Cart
    contains_css: true
  - name: Search
panels:
  - id: cart-panel
    module: Cart
";

fn lazyload(dir: &TempDir) -> Command {
    let app = dir.path().join("app");
    let mut cmd = Command::cargo_bin("lazyload").unwrap();
    cmd.current_dir(&app)
        .env("LAZYLOAD_CONFIG", app.join("lazyload.yaml"))
        .env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// `app/` holds the manifest; package builds sit beside it.
fn site(manifest: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app/lazyload.yaml", manifest);
    write(dir.path(), "Cart/Cart.js", "Ext.define('Cart.view.main.Main', {});");
    write(dir.path(), "Cart/resources/Cart-all.css", ".cart {}");
    write(dir.path(), "Search/Search.js", "Ext.define('Search.view.main.Main', {});");
    dir
}

// ---------------------------------------------------------------------------
// lazyload init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_starter_manifest() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("app")).unwrap();
    lazyload(&dir)
        .args(["init", "--name", "Shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let content = std::fs::read_to_string(dir.path().join("app/lazyload.yaml")).unwrap();
    assert!(content.contains("name: Shop"));
    assert!(content.contains("mode: dev"));
}

#[test]
fn init_leaves_existing_manifest_alone() {
    let dir = site(MANIFEST);
    lazyload(&dir)
        .args(["init", "--name", "Other"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    let content = std::fs::read_to_string(dir.path().join("app/lazyload.yaml")).unwrap();
    assert_eq!(content, MANIFEST);
}

// ---------------------------------------------------------------------------
// lazyload check
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_valid_manifest() {
    let dir = site(MANIFEST);
    lazyload(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Manifest is valid"));
}

#[test]
fn check_rejects_invalid_package_name() {
    let dir = site("name: Shop\npackages:\n  - name: \"not a namespace\"\n");
    lazyload(&dir)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"))
        .stderr(predicate::str::contains("manifest has errors"));
}

#[test]
fn check_rejects_repeated_package() {
    let dir = site("name: Shop\npackages:\n  - name: Cart\n  - name: Cart\n");
    lazyload(&dir)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "[error] package 'Cart' is declared more than once",
        ));
}

#[test]
fn check_missing_manifest_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("app")).unwrap();
    lazyload(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("manifest not found"));
}

// ---------------------------------------------------------------------------
// lazyload plan
// ---------------------------------------------------------------------------

#[test]
fn plan_lists_build_artifacts_in_order() {
    let dir = site(MANIFEST);
    lazyload(&dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Shop (build mode)"))
        .stdout(predicate::str::contains("../Cart/Cart.js"))
        .stdout(predicate::str::contains("../Cart/resources/Cart-all.css"))
        .stdout(predicate::str::contains("../Search/Search.js"));
}

#[test]
fn plan_dev_mode_uses_class_sources() {
    let manifest = "\
name: Shop
packages:
  - name: Cart
    contains_css: true
    requires:
      - Cart.view.Main
";
    let dir = site(manifest);
    let output = lazyload(&dir)
        .args(["--json", "plan", "--mode", "dev"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["mode"], "dev");
    let urls: Vec<&str> = json["assets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["url"].as_str().unwrap())
        .collect();
    assert_eq!(
        urls,
        vec![
            "../packages/local/Cart/src/view/Main.js",
            "../build/production/Shop/../Cart/resources/Cart-all.css",
        ]
    );
}

// ---------------------------------------------------------------------------
// lazyload run
// ---------------------------------------------------------------------------

#[test]
fn run_loads_every_package() {
    let dir = site(MANIFEST);
    lazyload(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded  Cart"))
        .stdout(predicate::str::contains("loaded  Search"))
        .stdout(predicate::str::contains("Ready: yes"));
}

#[test]
fn run_json_reports_declaration_order() {
    let dir = site(MANIFEST);
    let output = lazyload(&dir).args(["run", "--json"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["app_name"], "Shop");
    assert_eq!(report["ready"], true);
    assert_eq!(report["loaded"], serde_json::json!(["Cart", "Search"]));
    assert_eq!(report["style_failures"], serde_json::json!([]));
}

#[test]
fn run_missing_script_fails() {
    let dir = site(MANIFEST);
    std::fs::remove_file(dir.path().join("Search/Search.js")).unwrap();
    lazyload(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: package loading failed"))
        .stderr(predicate::str::contains("Search"));
}

#[test]
fn run_missing_stylesheet_still_ready() {
    let dir = site(MANIFEST);
    std::fs::remove_file(dir.path().join("Cart/resources/Cart-all.css")).unwrap();
    lazyload(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning] stylesheet"))
        .stdout(predicate::str::contains("Ready: yes"));
}

#[test]
fn run_explicit_page_dir() {
    let dir = site(MANIFEST);
    let elsewhere = TempDir::new().unwrap();
    lazyload(&dir)
        .args(["run", "--page-dir"])
        .arg(elsewhere.path().join("app"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cart"));
}

#[test]
fn run_rejects_bad_base_url() {
    let dir = site(MANIFEST);
    lazyload(&dir)
        .args(["run", "--base-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --base-url"));
}

// ---------------------------------------------------------------------------
// lazyload panel
// ---------------------------------------------------------------------------

#[test]
fn panel_loads_and_creates_main_view() {
    let dir = site(MANIFEST);
    lazyload(&dir)
        .args(["panel", "Cart"])
        .assert()
        .success()
        .stdout(predicate::str::contains("panel cart-panel (Cart)"))
        .stdout(predicate::str::contains("event: beforepackageload"))
        .stdout(predicate::str::contains("mask: Loading package"))
        .stdout(predicate::str::contains("event: endpackageload"))
        .stdout(predicate::str::contains(
            "create class Cart.view.main.Main with {}",
        ))
        .stdout(predicate::str::contains("state: activated"));
}

#[test]
fn panel_skips_loaded_namespace() {
    let dir = site(MANIFEST);
    std::fs::remove_file(dir.path().join("Cart/Cart.js")).unwrap();
    lazyload(&dir)
        .args(["panel", "Cart", "--loaded", "Cart"])
        .assert()
        .success()
        .stdout(predicate::str::contains("event: beforepackageload").not())
        .stdout(predicate::str::contains("state: activated"));
}

#[test]
fn panel_reports_load_failure() {
    let dir = site(MANIFEST);
    lazyload(&dir)
        .args(["panel", "Orders"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("event: errorpackageload"))
        .stdout(predicate::str::contains("state: failed"))
        .stderr(predicate::str::contains("panel 'Orders' failed"));
}
