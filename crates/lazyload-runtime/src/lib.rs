//! `lazyload-runtime`: async package loading for applications with an
//! optional module catalog.
//!
//! # Architecture
//!
//! ```text
//! AppConfig ──► LoaderContext (env, defaults, fetcher, registry)
//!                   │
//!        ┌──────────┴───────────┐
//!        ▼                      ▼
//! PackageLoader            LazyPanel<H>
//!   one run per start        one load per panel, on first render
//!   outer Barrier over       script ─► stylesheet? ─► main view
//!   every package
//!        │
//!        ▼
//! ReadySignal              ← gates application startup
//! ```
//!
//! Fetching itself is a capability: [`AssetFetcher`] is implemented by
//! [`HttpFetcher`] (reqwest) and [`FsFetcher`] (local files), and hosts may
//! supply their own.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use lazyload_runtime::{FsFetcher, LoaderContext, PackageLoader};
//!
//! let context = LoaderContext::from_config(&config, FsFetcher::new("site/app"));
//! let loader = PackageLoader::new(context);
//! let ready = loader.ready_signal();
//! let report = loader.run(config.all_packages()).await?;
//! assert!(ready.is_ready());
//! ```

pub mod context;
pub mod fetch;
pub mod orchestrator;
pub mod panel;
pub mod ready;

#[cfg(test)]
pub(crate) mod testing;

pub use context::LoaderContext;
pub use fetch::{AssetFetcher, FsFetcher, HttpFetcher};
pub use lazyload_core::{FetchError, LoadError, Result};
pub use orchestrator::{PackageLoader, RunReport, StyleFailure};
pub use panel::{LazyPanel, Listener, LoadInfo, MainView, PanelEvent, PanelHost, PanelState};
pub use ready::ReadySignal;
