use crate::output::{print_json, print_table};
use anyhow::Context;
use lazyload_core::package::AssetKind;
use lazyload_core::LoadMode;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PlannedAsset {
    package: String,
    kind: AssetKind,
    url: String,
}

pub fn run(config_path: &Path, mode: Option<LoadMode>, json: bool) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(mode) = mode {
        config.mode = mode;
    }
    let env = config.environment();
    let defaults = config.defaults();

    let mut planned = Vec::new();
    for descriptor in config.all_packages() {
        let pkg = descriptor
            .resolve(&defaults)
            .with_context(|| format!("cannot plan package '{}'", descriptor.name))?;
        for asset in pkg.plan(&env)? {
            planned.push(PlannedAsset {
                package: pkg.name.clone(),
                kind: asset.kind,
                url: asset.url,
            });
        }
    }

    if json {
        return print_json(&serde_json::json!({
            "app": env.app_name,
            "mode": env.mode,
            "assets": planned,
        }));
    }

    println!("{} ({} mode)", env.app_name, env.mode);
    if planned.is_empty() {
        println!("No assets to fetch.");
        return Ok(());
    }
    let rows = planned
        .into_iter()
        .map(|a| {
            let kind = match a.kind {
                AssetKind::Script => "script",
                AssetKind::Stylesheet => "stylesheet",
            };
            vec![a.package, kind.to_string(), a.url]
        })
        .collect();
    print_table(&["PACKAGE", "KIND", "URL"], rows);
    Ok(())
}
