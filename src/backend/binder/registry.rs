//! Binder Registry
//!
//! Maps string keys to [`ContextBinder`] implementations and falls back to a
//! default binder when a key is absent or unknown. Registration is
//! insert-once: a second registration under the same key is rejected and the
//! first binder stays in place. Lookups and registrations are safe from any
//! number of threads.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{ContextBinder, InlineBinder, PoolBinder, ThreadBinder};
use crate::backend::errors::{Result, TrapError};
use crate::config::{BinderKind, TrapConfig};

/// Keyed binders plus a default
pub struct BinderRegistry {
    binders: DashMap<String, Arc<dyn ContextBinder>>,
    default: RwLock<Arc<dyn ContextBinder>>,
}

impl BinderRegistry {
    /// Create an empty registry with the given default binder
    pub fn new(default: Arc<dyn ContextBinder>) -> Self {
        Self {
            binders: DashMap::new(),
            default: RwLock::new(default),
        }
    }

    /// Create an empty registry whose default is chosen by `config.default_binder`
    pub fn from_config(config: &TrapConfig) -> Result<Self> {
        let default: Arc<dyn ContextBinder> = match config.default_binder {
            BinderKind::Thread => Arc::new(ThreadBinder::from_config(config)),
            BinderKind::Inline => Arc::new(InlineBinder),
            BinderKind::Pool => Arc::new(PoolBinder::new(config)?),
        };
        Ok(Self::new(default))
    }

    /// Register `binder` under `key`.
    ///
    /// Fails with [`TrapError::DuplicateBinder`] if the key is taken.
    pub fn register(&self, key: impl Into<String>, binder: Arc<dyn ContextBinder>) -> Result<()> {
        match self.binders.entry(key.into()) {
            Entry::Occupied(existing) => {
                let key = existing.key().clone();
                warn!(target: "tailtrap::binder", key = %key, "binder key already registered");
                Err(TrapError::DuplicateBinder(key))
            }
            Entry::Vacant(slot) => {
                debug!(target: "tailtrap::binder", key = %slot.key(), binder = binder.name(), "binder registered");
                slot.insert(binder);
                Ok(())
            }
        }
    }

    /// Binder for `key`, or the default when `key` is `None` or unknown
    pub fn lookup(&self, key: Option<&str>) -> Arc<dyn ContextBinder> {
        key.and_then(|key| self.get(key)).unwrap_or_else(|| self.default_binder())
    }

    /// Binder registered under exactly `key`
    pub fn get(&self, key: &str) -> Option<Arc<dyn ContextBinder>> {
        self.binders.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.binders.contains_key(key)
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.binders.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.binders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }

    pub fn default_binder(&self) -> Arc<dyn ContextBinder> {
        Arc::clone(&self.default.read())
    }

    /// Replace the default binder; calls already dispatched keep the old one
    pub fn set_default(&self, binder: Arc<dyn ContextBinder>) {
        debug!(target: "tailtrap::binder", binder = binder.name(), "default binder replaced");
        *self.default.write() = binder;
    }
}

impl Default for BinderRegistry {
    fn default() -> Self {
        Self::new(Arc::new(ThreadBinder::new()))
    }
}

impl std::fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinderRegistry")
            .field("keys", &self.keys())
            .field("default", &self.default.read().name())
            .finish()
    }
}

/// Global binder registry, configured from `TAILTRAP_*` environment variables
static GLOBAL_BINDER_REGISTRY: std::sync::LazyLock<BinderRegistry> = std::sync::LazyLock::new(|| {
    let config = TrapConfig::from_env();
    BinderRegistry::from_config(&config).unwrap_or_else(|e| {
        warn!(target: "tailtrap::binder", error = %e, "falling back to thread binder");
        BinderRegistry::new(Arc::new(ThreadBinder::from_config(&config)))
    })
});

/// Get a reference to the global binder registry
pub fn global_registry() -> &'static BinderRegistry {
    &GLOBAL_BINDER_REGISTRY
}
