pub mod check;
pub mod init;
pub mod panel;
pub mod plan;
pub mod run;

use anyhow::Context;
use clap::Args;
use lazyload_core::config::AppConfig;
use lazyload_core::LoadMode;
use lazyload_runtime::{AssetFetcher, FsFetcher, HttpFetcher};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where assets are fetched from.
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// URL of the application's index page; assets are fetched over HTTP
    #[arg(long, conflicts_with = "page_dir")]
    pub base_url: Option<String>,

    /// Directory of the application's index page (default: the manifest's directory)
    #[arg(long)]
    pub page_dir: Option<PathBuf>,

    /// Override the manifest's load mode (build or dev)
    #[arg(long)]
    pub mode: Option<LoadMode>,
}

impl FetchArgs {
    pub fn fetcher(&self, config_path: &Path) -> anyhow::Result<Arc<dyn AssetFetcher>> {
        if let Some(url) = &self.base_url {
            let fetcher = HttpFetcher::new(url).context("invalid --base-url")?;
            return Ok(Arc::new(fetcher));
        }
        let dir = self
            .page_dir
            .clone()
            .unwrap_or_else(|| crate::root::page_dir(config_path));
        let dir = std::fs::canonicalize(&dir).unwrap_or(dir);
        tracing::debug!(page_dir = %dir.display(), "reading assets from disk");
        Ok(Arc::new(FsFetcher::new(dir)))
    }

    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
    }
}

pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    AppConfig::load(config_path)
        .with_context(|| format!("failed to load manifest {}", config_path.display()))
}

/// Drive `fut` to completion, reusing the current runtime when there is one.
pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(tokio::task::block_in_place(|| handle.block_on(fut))),
        Err(_) => {
            tracing::debug!("using new tokio runtime");
            let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            Ok(rt.block_on(fut))
        }
    }
}
