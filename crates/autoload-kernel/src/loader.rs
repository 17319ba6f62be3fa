//! Per-namespace loader.
//!
//! A loader resolves a class identifier through three mechanisms, in
//! priority order:
//!
//! 1. the override table (explicit class -> path entries),
//! 2. the alias table (delegation to another namespace's loader),
//! 3. its path strategy (a naming convention, or a custom resolver).
//!
//! A miss is `Ok(false)`: callers move on to the next loader.

use crate::alias::{self, AliasTable};
use crate::context::LoadContext;
use crate::error::AutoloadError;
use crate::host::ClassHost;
use crate::search_path::SearchPaths;
use crate::strategy::{CLASSES_DIR, Convention, DEFAULT_EXTENSION, PathStrategy};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Immutable identity of a loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub namespace: String,
    pub base_path: String,
    pub strategy: PathStrategy,
    pub extension: String,
}

impl LoaderConfig {
    pub fn new(
        namespace: impl Into<String>,
        base_path: impl Into<String>,
        strategy: PathStrategy,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            base_path: base_path.into(),
            strategy,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn legacy(namespace: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self::new(namespace, base_path, PathStrategy::Legacy)
    }

    pub fn psr0(namespace: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self::new(namespace, base_path, PathStrategy::Psr0)
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// One namespace's search configuration and tables.
#[derive(Debug)]
pub struct Loader {
    config: LoaderConfig,
    paths: RwLock<SearchPaths>,
    classes: RwLock<IndexMap<String, PathBuf>>,
    aliases: RwLock<AliasTable>,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        let paths = SearchPaths::new([config.base_path.as_str()]);
        Self {
            config,
            paths: RwLock::new(paths),
            classes: RwLock::new(IndexMap::new()),
            aliases: RwLock::new(AliasTable::default()),
        }
    }

    pub fn shared(config: LoaderConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn base_path(&self) -> &str {
        &self.config.base_path
    }

    pub fn strategy(&self) -> &PathStrategy {
        &self.config.strategy
    }

    pub fn extension(&self) -> &str {
        &self.config.extension
    }

    // ── Override table ──────────────────────────────────────────────

    /// Map `class_id` to an explicit file, replacing any earlier entry.
    ///
    /// The path is not checked until the class is loaded.
    pub fn add_class(&self, class_id: impl Into<String>, path: impl Into<PathBuf>) -> &Self {
        self.classes.write().insert(class_id.into(), path.into());
        self
    }

    /// Bulk [`add_class`](Self::add_class); later entries win on collision.
    pub fn add_classes<I, K, P>(&self, classes: I) -> &Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PathBuf>,
    {
        let mut table = self.classes.write();
        for (class_id, path) in classes {
            table.insert(class_id.into(), path.into());
        }
        drop(table);
        self
    }

    pub fn class_path(&self, class_id: &str) -> Option<PathBuf> {
        self.classes.read().get(class_id).cloned()
    }

    pub fn class_count(&self) -> usize {
        self.classes.read().len()
    }

    // ── Alias table ─────────────────────────────────────────────────

    /// Satisfy requests under this loader's namespace by delegating the
    /// same remainder under `foreign_namespace` to `loader`.
    pub fn add_namespace_alias(
        &self,
        foreign_namespace: impl Into<String>,
        loader: Arc<Loader>,
    ) -> &Self {
        self.aliases.write().insert(foreign_namespace, loader);
        self
    }

    pub fn aliases(&self) -> AliasTable {
        self.aliases.read().clone()
    }

    // ── Search paths ────────────────────────────────────────────────

    /// See [`SearchPaths::add_path`] for position semantics.
    pub fn add_path(
        &self,
        path: impl AsRef<str>,
        position: Option<i64>,
    ) -> Result<&Self, AutoloadError> {
        self.paths.write().add_path(path, position)?;
        Ok(self)
    }

    pub fn add_paths<I, P>(&self, paths: I, position: Option<i64>) -> Result<&Self, AutoloadError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.paths.write().add_paths(paths, position)?;
        Ok(self)
    }

    pub fn search_paths(&self) -> SearchPaths {
        self.paths.read().clone()
    }

    /// First existing `root/subdir/filename.ext` across the search roots.
    ///
    /// `ext` defaults to the loader's extension. Nothing is loaded.
    pub fn find_file(
        &self,
        host: &dyn ClassHost,
        subdir: &str,
        filename: &str,
        ext: Option<&str>,
    ) -> Option<PathBuf> {
        let ext = ext.unwrap_or(self.config.extension.as_str());
        let paths = self.paths.read();
        paths
            .candidates(subdir, filename, ext)
            .find(|candidate| host.file_exists(candidate))
    }

    // ── Resolution ──────────────────────────────────────────────────

    /// Resolve `class_id` and hand the resulting file to the host.
    pub fn resolve_and_load(
        &self,
        class_id: &str,
        cx: &mut LoadContext<'_>,
    ) -> Result<bool, AutoloadError> {
        if let Some(path) = self.class_path(class_id) {
            return self.load_override(class_id, &path, cx);
        }
        if alias::resolve_alias(self, class_id, cx)? {
            return Ok(true);
        }
        self.resolve_by_strategy(class_id, cx)
    }

    /// [`resolve_and_load`](Self::resolve_and_load) without the alias step.
    pub fn resolve_without_aliases(
        &self,
        class_id: &str,
        cx: &mut LoadContext<'_>,
    ) -> Result<bool, AutoloadError> {
        if let Some(path) = self.class_path(class_id) {
            return self.load_override(class_id, &path, cx);
        }
        self.resolve_by_strategy(class_id, cx)
    }

    /// Derive a path with `convention` and load it if it exists.
    ///
    /// Custom resolvers can fall back to this.
    pub fn load_by_convention(
        &self,
        class_id: &str,
        convention: Convention,
        cx: &mut LoadContext<'_>,
    ) -> Result<bool, AutoloadError> {
        let relative = convention.derive(self.namespace(), class_id);
        let Some(path) = self.find_file(cx.host(), CLASSES_DIR, &relative, None) else {
            tracing::trace!(
                class = class_id,
                namespace = self.namespace(),
                relative = %relative,
                "no file for class"
            );
            return Ok(false);
        };
        cx.load_file(&path)
    }

    fn resolve_by_strategy(
        &self,
        class_id: &str,
        cx: &mut LoadContext<'_>,
    ) -> Result<bool, AutoloadError> {
        match &self.config.strategy {
            PathStrategy::Legacy => self.load_by_convention(class_id, Convention::Legacy, cx),
            PathStrategy::Psr0 => self.load_by_convention(class_id, Convention::Psr0, cx),
            PathStrategy::Custom(resolver) => resolver(class_id, self, cx),
        }
    }

    fn load_override(
        &self,
        class_id: &str,
        path: &Path,
        cx: &mut LoadContext<'_>,
    ) -> Result<bool, AutoloadError> {
        tracing::trace!(class = class_id, path = %path.display(), "override hit");
        cx.require_file(path)?;
        Ok(true)
    }
}
