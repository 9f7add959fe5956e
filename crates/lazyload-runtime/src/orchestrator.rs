use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use lazyload_core::{
    Asset, Barrier, LoadError, LoadMode, PackageDescriptor, ResolvedPackage, Result,
};
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::context::LoaderContext;
use crate::ready::{self, ReadySignal, ReadyTrigger};

// ─── RunReport ────────────────────────────────────────────────────────────

/// A stylesheet that failed to load while its package still counted as loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleFailure {
    pub package: String,
    pub url: String,
    pub message: String,
}

/// Summary of a completed orchestrator run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub app_name: String,
    pub mode: LoadMode,
    /// Packages in declaration order.
    pub loaded: Vec<String>,
    pub style_failures: Vec<StyleFailure>,
    pub ready: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// ─── PackageLoader ────────────────────────────────────────────────────────

/// Loads every application package and then flips the ready signal.
///
/// A loader is good for exactly one run: [`run`](Self::run) consumes it.
/// Take a [`ReadySignal`] first if anything needs to gate on readiness.
///
/// ```rust,ignore
/// let loader = PackageLoader::new(context);
/// let ready = loader.ready_signal();
/// let app = tokio::spawn(async move { ready.gate(launch_app()).await });
/// loader.run(config.all_packages()).await?;
/// ```
#[derive(Debug)]
pub struct PackageLoader {
    context: LoaderContext,
    trigger: ReadyTrigger,
    signal: ReadySignal,
}

impl PackageLoader {
    pub fn new(context: LoaderContext) -> Self {
        let (trigger, signal) = ready::channel();
        Self {
            context,
            trigger,
            signal,
        }
    }

    pub fn ready_signal(&self) -> ReadySignal {
        self.signal.clone()
    }

    /// Load `packages` concurrently and fire the ready signal once all of
    /// them arrived.
    ///
    /// Stylesheet failures are logged and reported but still count as an
    /// arrival. A script failure withholds that package's arrival, so the
    /// ready signal never fires; the first such failure (in declaration
    /// order) is returned after every package has settled.
    pub async fn run(self, packages: Vec<PackageDescriptor>) -> Result<RunReport> {
        let PackageLoader {
            context,
            trigger,
            signal,
        } = self;
        let started_at = Utc::now();
        info!(
            app = %context.env.app_name,
            mode = %context.env.mode,
            count = packages.len(),
            "loading packages"
        );

        let resolved = resolve_all(&packages, &context)?;

        let barrier = Barrier::new(resolved.len(), move || {
            if trigger.fire() {
                info!("packages ready");
            }
        });

        let loads: Vec<_> = resolved
            .iter()
            .map(|pkg| load_package(&context, pkg, &barrier))
            .collect();
        let outcomes = join_all(loads).await;

        let mut loaded = Vec::new();
        let mut style_failures = Vec::new();
        let mut first_failure = None;
        for outcome in outcomes {
            match outcome {
                Ok(arrived) => {
                    loaded.push(arrived.name);
                    style_failures.extend(arrived.style_failure);
                }
                Err(e) => {
                    first_failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_failure {
            error!(
                failed = resolved.len() - loaded.len(),
                "package run ended without readiness"
            );
            return Err(e);
        }

        Ok(RunReport {
            app_name: context.env.app_name.clone(),
            mode: context.env.mode,
            loaded,
            style_failures,
            ready: signal.is_ready(),
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Apply defaults to every descriptor. Names must be unique within a run.
fn resolve_all(
    packages: &[PackageDescriptor],
    context: &LoaderContext,
) -> Result<Vec<ResolvedPackage>> {
    let mut seen = HashSet::new();
    packages
        .iter()
        .map(|p| {
            if !seen.insert(p.name.as_str()) {
                return Err(LoadError::InvalidConfiguration(format!(
                    "package '{}' is declared more than once",
                    p.name
                )));
            }
            p.resolve(&context.defaults)
        })
        .collect()
}

// ─── Per-package load ─────────────────────────────────────────────────────

struct Arrived {
    name: String,
    style_failure: Option<StyleFailure>,
}

async fn load_package(
    context: &LoaderContext,
    pkg: &ResolvedPackage,
    barrier: &Barrier,
) -> Result<Arrived> {
    let scripts = match context.env.mode {
        LoadMode::Build => load_build(context, pkg).await,
        LoadMode::Dev => load_dev(context, pkg).await,
    };
    if let Err(e) = scripts {
        error!(package = %pkg.name, error = %e, "package load error");
        return Err(e);
    }

    let style_failure = match pkg.stylesheet_url(&context.env) {
        None => None,
        Some(url) => match context.fetcher.fetch(&Asset::stylesheet(url.clone())).await {
            Ok(()) => None,
            Err(source) => {
                let e = LoadError::StyleLoad {
                    package: pkg.name.clone(),
                    url: url.clone(),
                    source,
                };
                error!(package = %pkg.name, error = %e, "package stylesheet error");
                Some(StyleFailure {
                    package: pkg.name.clone(),
                    url,
                    message: e.to_string(),
                })
            }
        },
    };

    context.registry.mark_loaded(pkg.name.clone());
    let reach = barrier.reach();
    debug!(package = %pkg.name, reach = ?reach, "package arrived");
    Ok(Arrived {
        name: pkg.name.clone(),
        style_failure,
    })
}

/// Fetch the single pre-bundled artifact.
async fn load_build(context: &LoaderContext, pkg: &ResolvedPackage) -> Result<()> {
    let url = pkg.build_script_url();
    context
        .fetcher
        .fetch(&Asset::script(url.clone()))
        .await
        .map_err(|source| LoadError::PackageLoad {
            package: pkg.name.clone(),
            url,
            source,
        })
}

/// Fetch every required class concurrently, joined by a nested barrier.
///
/// The barrier's completion is the join point. A failed fetch never reaches
/// it, so the first failure ends the wait instead.
async fn load_dev(context: &LoaderContext, pkg: &ResolvedPackage) -> Result<()> {
    let sources = pkg.requirement_urls()?;
    let (done_tx, done_rx) = oneshot::channel();
    let barrier = Barrier::new(sources.len(), move || {
        let _ = done_tx.send(());
    });

    let barrier = &barrier;
    let mut fetches: FuturesUnordered<_> = sources
        .iter()
        .map(|(class, url)| async move {
            context
                .fetcher
                .fetch(&Asset::script(url.clone()))
                .await
                .map_err(|source| LoadError::PackageLoad {
                    package: pkg.name.clone(),
                    url: url.clone(),
                    source,
                })?;
            debug!(package = %pkg.name, class = %class, "class loaded");
            barrier.reach();
            Ok::<(), LoadError>(())
        })
        .collect();
    let first_failure = async {
        while let Some(result) = fetches.next().await {
            result?;
        }
        std::future::pending::<Result<()>>().await
    };

    tokio::select! {
        done = done_rx => {
            if done.is_err() {
                return Err(LoadError::InvalidConfiguration(format!(
                    "source barrier for package '{}' was dropped",
                    pkg.name
                )));
            }
        }
        failure = first_failure => return failure,
    }
    debug!(package = %pkg.name, count = sources.len(), "package sources loaded");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────
