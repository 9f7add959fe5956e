use lazyload_core::paths::CONFIG_FILE;
use std::path::{Path, PathBuf};

/// Resolve the application manifest path.
///
/// Priority:
/// 1. `--config` flag / `LAZYLOAD_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `lazyload.yaml`
/// 3. Fall back to `cwd/lazyload.yaml`
pub fn resolve_config(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd).unwrap_or_else(|| cwd.join(CONFIG_FILE))
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Directory of the index page: asset URLs are relative to it.
pub fn page_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
