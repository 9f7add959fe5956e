use std::fmt;
use std::sync::Arc;

use lazyload_core::config::AppConfig;
use lazyload_core::{HostEnvironment, ModuleRegistry, PackageDefaults};

use crate::fetch::AssetFetcher;

/// Collaborators shared by the orchestrator and every lazy panel.
#[derive(Clone)]
pub struct LoaderContext {
    pub env: HostEnvironment,
    pub defaults: PackageDefaults,
    pub fetcher: Arc<dyn AssetFetcher>,
    pub registry: ModuleRegistry,
}

impl LoaderContext {
    pub fn new(env: HostEnvironment, fetcher: impl AssetFetcher + 'static) -> Self {
        Self {
            env,
            defaults: PackageDefaults::default(),
            fetcher: Arc::new(fetcher),
            registry: ModuleRegistry::new(),
        }
    }

    pub fn from_config(config: &AppConfig, fetcher: impl AssetFetcher + 'static) -> Self {
        Self::new(config.environment(), fetcher).with_defaults(config.defaults())
    }

    pub fn with_defaults(mut self, defaults: PackageDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_registry(mut self, registry: ModuleRegistry) -> Self {
        self.registry = registry;
        self
    }
}

impl fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderContext")
            .field("env", &self.env)
            .field("defaults", &self.defaults)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
