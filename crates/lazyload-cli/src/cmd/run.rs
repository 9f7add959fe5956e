use super::FetchArgs;
use crate::output::print_json;
use anyhow::Context;
use chrono::Utc;
use lazyload_runtime::{LoaderContext, PackageLoader, RunReport};
use std::path::Path;

pub fn run(config_path: &Path, args: &FetchArgs, json: bool) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    args.apply(&mut config);
    let fetcher = args.fetcher(config_path)?;

    let context = LoaderContext::from_config(&config, fetcher);
    let loader = PackageLoader::new(context);
    let ready = loader.ready_signal();
    let packages = config.all_packages();

    let (report, started) = super::block_on(async move {
        let startup = ready.gate(async { Utc::now() });
        tokio::join!(loader.run(packages), startup)
    })?;
    let report = report.context("package loading failed")?;

    if let Some(at) = started {
        tracing::info!(app = %report.app_name, at = %at, "application startup released");
    }

    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("{} ({} mode)", report.app_name, report.mode);
    if report.loaded.is_empty() {
        println!("No packages declared.");
    }
    for name in &report.loaded {
        println!("  loaded  {name}");
    }
    for failure in &report.style_failures {
        println!(
            "  [warning] stylesheet {} for '{}' failed: {}",
            failure.url, failure.package, failure.message
        );
    }
    let elapsed = report.finished_at - report.started_at;
    println!(
        "Ready: {} ({} ms)",
        if report.ready { "yes" } else { "no" },
        elapsed.num_milliseconds()
    );
}
