use crate::error::{LoadError, Result};
use regex::Regex;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_PACKAGE_PATH: &str = "../packages/local/";
pub const DEFAULT_PACKAGE_BUILD_PATH: &str = "../";
pub const DEFAULT_LOADING_TEXT: &str = "Loading package";

pub const PRODUCTION_BUILD_ROOT: &str = "../build/production/";
pub const MAIN_VIEW_SUFFIX: &str = ".view.main.Main";

pub const CONFIG_FILE: &str = "lazyload.yaml";

// ---------------------------------------------------------------------------
// Asset URL helpers
// ---------------------------------------------------------------------------

/// Roots are configured with a trailing slash; tolerate one that lacks it.
fn dir(root: &str) -> String {
    if root.is_empty() || root.ends_with('/') {
        root.to_string()
    } else {
        format!("{root}/")
    }
}

/// `<build_path><name>/<name>.js`
pub fn build_script_url(build_path: &str, name: &str) -> String {
    format!("{}{name}/{name}.js", dir(build_path))
}

/// `<style_root><name>/resources/<name>-all.css`
pub fn stylesheet_url(style_root: &str, name: &str) -> String {
    format!("{}{name}/resources/{name}-all.css", dir(style_root))
}

pub fn build_stylesheet_url(build_path: &str, name: &str) -> String {
    stylesheet_url(build_path, name)
}

/// Stylesheets in dev mode come from the application's production build.
pub fn dev_stylesheet_root(app_name: &str, build_path: &str) -> String {
    format!("{PRODUCTION_BUILD_ROOT}{app_name}/{build_path}")
}

pub fn dev_stylesheet_url(app_name: &str, build_path: &str, name: &str) -> String {
    stylesheet_url(&dev_stylesheet_root(app_name, build_path), name)
}

/// `<package_path><name>/src`: where a namespace's classes live in dev mode.
pub fn source_root(package_path: &str, name: &str) -> String {
    format!("{}{name}/src", dir(package_path))
}

/// Map a dotted class name inside `namespace` onto its source file.
///
/// `Shop.view.main.Main` under namespace `Shop` becomes
/// `<source_root>/view/main/Main.js`. Returns `None` for classes outside the
/// namespace or for the bare namespace itself.
pub fn class_source_url(source_root: &str, namespace: &str, class: &str) -> Option<String> {
    let relative = class.strip_prefix(namespace)?.strip_prefix('.')?;
    if relative.is_empty() {
        return None;
    }
    Some(format!(
        "{}{}.js",
        dir(source_root),
        relative.replace('.', "/")
    ))
}

pub fn default_main_class(module: &str) -> String {
    format!("{module}{MAIN_VIEW_SUFFIX}")
}

// ---------------------------------------------------------------------------
// Namespace validation
// ---------------------------------------------------------------------------

static NAMESPACE_RE: OnceLock<Regex> = OnceLock::new();

fn namespace_re() -> &'static Regex {
    NAMESPACE_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
            .expect("namespace pattern is valid")
    })
}

/// Package names double as namespaces and URL segments.
pub fn validate_namespace(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 128 || !namespace_re().is_match(name) {
        return Err(LoadError::InvalidConfiguration(format!(
            "invalid package name '{name}': must be a dotted identifier"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
