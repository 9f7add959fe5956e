use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Namespaces known to the host application.
///
/// Clones share one set, so the orchestrator, every panel and the host can
/// hold their own handle. A namespace counts as present when it was
/// registered itself or when one of its children was (`Admin.Reports`
/// implies `Admin`).
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    loaded: Arc<RwLock<BTreeSet<String>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modules<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for m in modules {
            registry.mark_loaded(m);
        }
        registry
    }

    pub fn contains(&self, namespace: &str) -> bool {
        if namespace.is_empty() {
            return false;
        }
        let loaded = self.read();
        if loaded.contains(namespace) {
            return true;
        }
        let prefix = format!("{namespace}.");
        loaded
            .range(prefix.clone()..)
            .next()
            .is_some_and(|n| n.starts_with(&prefix))
    }

    /// Register `namespace`. Returns `false` if it was already registered.
    pub fn mark_loaded(&self, namespace: impl Into<String>) -> bool {
        self.write().insert(namespace.into())
    }

    pub fn loaded(&self) -> Vec<String> {
        self.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeSet<String>> {
        self.loaded.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeSet<String>> {
        self.loaded.write().unwrap_or_else(|p| p.into_inner())
    }
}
