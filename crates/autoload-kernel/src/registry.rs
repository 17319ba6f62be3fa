//! The registry: ordered namespace loaders behind a single `load` entry point.
//!
//! `load` normalizes the identifier, probes eligible loaders in registration
//! order, and fires the class initializer once for the externally requested
//! identifier. Loads triggered while that identifier's file is being defined
//! go through the same [`LoadContext`] and never fire initializers.

use crate::class_id;
use crate::context::{LoadContext, LoadLedger};
use crate::error::AutoloadError;
use crate::hook::HookChain;
use crate::host::ClassHost;
use crate::loader::Loader;
use crate::policy::{DispatchPolicy, loader_is_eligible};
use indexmap::IndexMap;
use parking_lot::ReentrantMutex;
use serde::Serialize;
use std::sync::Arc;

pub struct Registry {
    host: Arc<dyn ClassHost>,
    loaders: IndexMap<String, Arc<Loader>>,
    policy: DispatchPolicy,
    ledger: LoadLedger,
    // serializes top-level loads; re-entrant so initializers may load too
    lock: ReentrantMutex<()>,
}

impl Registry {
    pub fn new(host: Arc<dyn ClassHost>) -> Self {
        Self::with_policy(host, DispatchPolicy::default())
    }

    pub fn with_policy(host: Arc<dyn ClassHost>, policy: DispatchPolicy) -> Self {
        Self {
            host,
            loaders: IndexMap::new(),
            policy,
            ledger: LoadLedger::default(),
            lock: ReentrantMutex::new(()),
        }
    }

    pub fn host(&self) -> &dyn ClassHost {
        self.host.as_ref()
    }

    /// Files handed to the host so far, in load order.
    pub fn ledger(&self) -> &LoadLedger {
        &self.ledger
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: DispatchPolicy) {
        self.policy = policy;
    }

    /// Register `loader` under its own namespace.
    ///
    /// A loader already registered for that namespace is replaced (keeping
    /// its position) and returned.
    pub fn add_loader(&mut self, loader: Arc<Loader>) -> Option<Arc<Loader>> {
        let namespace = loader.namespace().to_string();
        self.loaders.insert(namespace, loader)
    }

    /// Register several loaders keyed by namespace.
    ///
    /// Appended entries overwrite existing keys in place. With `prepend`,
    /// the new entries move to the front and take priority over everything
    /// registered before; their values win on key collision.
    pub fn add_loaders<I, K>(&mut self, loaders: I, prepend: bool)
    where
        I: IntoIterator<Item = (K, Arc<Loader>)>,
        K: Into<String>,
    {
        if !prepend {
            for (namespace, loader) in loaders {
                self.loaders.insert(namespace.into(), loader);
            }
            return;
        }

        let mut merged: IndexMap<String, Arc<Loader>> = loaders
            .into_iter()
            .map(|(namespace, loader)| (namespace.into(), loader))
            .collect();
        for (namespace, loader) in std::mem::take(&mut self.loaders) {
            merged.entry(namespace).or_insert(loader);
        }
        self.loaders = merged;
    }

    pub fn namespace_loader(&self, namespace: &str) -> Option<&Arc<Loader>> {
        self.loaders.get(namespace)
    }

    /// Registered namespaces in resolution order.
    pub fn namespaces(&self) -> Vec<&str> {
        self.loaders.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Install [`load`](Self::load) at the end of the host's hook chain.
    ///
    /// The hook slot only speaks success/failure, so errors are logged and
    /// reported as `false`.
    pub fn register(self: &Arc<Self>, chain: &mut dyn HookChain) {
        let registry = Arc::clone(self);
        chain.append(Arc::new(move |class_id: &str| {
            match registry.load(class_id) {
                Ok(loaded) => loaded,
                Err(err) => {
                    tracing::warn!(class = class_id, error = %err, "autoload failed");
                    false
                }
            }
        }));
    }

    /// Resolve and load `class_id`, firing its initializer at most once.
    ///
    /// Returns whether any loader succeeded. An identifier that is already
    /// defined is a fast-path success with no side effects. The initializer
    /// only runs when this request handed at least one file to the host.
    pub fn load(&self, class_id: &str) -> Result<bool, AutoloadError> {
        let class_id = class_id::normalize(class_id);
        let _guard = self.lock.lock();

        if self.host.is_defined(class_id) {
            tracing::trace!(class = class_id, "already defined");
            return Ok(true);
        }

        let mut cx = LoadContext::top_level(self);
        let loaded = self.dispatch(&mut cx, class_id)?;
        // A synonym of an already-defined class loads no file: its
        // initializer ran with the original.
        if loaded && cx.files_loaded() > 0 && self.host.initialize(class_id) {
            tracing::debug!(class = class_id, "ran initializer");
        }
        Ok(loaded)
    }

    pub(crate) fn dispatch(
        &self,
        cx: &mut LoadContext<'_>,
        class_id: &str,
    ) -> Result<bool, AutoloadError> {
        cx.enter(class_id)?;
        let result = self.probe_loaders(cx, class_id);
        cx.leave();
        result
    }

    fn probe_loaders(
        &self,
        cx: &mut LoadContext<'_>,
        class_id: &str,
    ) -> Result<bool, AutoloadError> {
        let mut loaded = false;
        for (namespace, loader) in &self.loaders {
            if !loader_is_eligible(class_id, namespace, self.policy.eligibility) {
                continue;
            }
            tracing::trace!(class = class_id, namespace = %namespace, "probing loader");
            if loader.resolve_and_load(class_id, cx)? {
                tracing::debug!(
                    class = class_id,
                    namespace = %namespace,
                    depth = cx.depth(),
                    "class loaded"
                );
                loaded = true;
                if self.policy.stop_on_first_match {
                    break;
                }
            }
        }
        Ok(loaded)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            policy: self.policy,
            loaders: self
                .loaders
                .iter()
                .map(|(key, loader)| LoaderSnapshot {
                    key: key.clone(),
                    namespace: loader.namespace().to_string(),
                    strategy: loader.strategy().name().to_string(),
                    extension: loader.extension().to_string(),
                    search_paths: loader.search_paths().as_slice().to_vec(),
                    overrides: loader.class_count(),
                    aliases: loader.aliases().namespaces(),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("namespaces", &self.namespaces())
            .field("policy", &self.policy)
            .field("loaded_files", &self.ledger.len())
            .finish()
    }
}

/// Serializable view of a registry's configuration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    pub policy: DispatchPolicy,
    pub loaders: Vec<LoaderSnapshot>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoaderSnapshot {
    /// Registration key (usually equal to `namespace`).
    pub key: String,
    pub namespace: String,
    pub strategy: String,
    pub extension: String,
    pub search_paths: Vec<String>,
    pub overrides: usize,
    pub aliases: Vec<String>,
}
