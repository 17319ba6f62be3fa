//! Namespace aliasing between loaders.
//!
//! A loader may satisfy a request for `Own\X` by resolving `Foreign\X`
//! through another loader and registering `Own\X` as a synonym of it. The
//! alias entry only records the relation: the foreign loader stays owned by
//! the registry.

use crate::class_id;
use crate::context::LoadContext;
use crate::error::AutoloadError;
use crate::loader::Loader;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Foreign namespace prefix -> loader that owns it, in insertion order.
#[derive(Clone, Default)]
pub struct AliasTable {
    entries: IndexMap<String, Arc<Loader>>,
}

impl AliasTable {
    /// Record an alias; a later entry for the same namespace replaces the
    /// earlier one in place.
    pub fn insert(&mut self, foreign_namespace: impl Into<String>, loader: Arc<Loader>) {
        self.entries.insert(foreign_namespace.into(), loader);
    }

    pub fn get(&self, foreign_namespace: &str) -> Option<&Arc<Loader>> {
        self.entries.get(foreign_namespace)
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> Vec<(String, Arc<Loader>)> {
        self.entries
            .iter()
            .map(|(namespace, loader)| (namespace.clone(), Arc::clone(loader)))
            .collect()
    }
}

impl fmt::Debug for AliasTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(namespace, loader)| (namespace, loader.namespace())),
            )
            .finish()
    }
}

/// The identifier `class_id` maps to under `foreign_namespace`.
///
/// The remainder is taken after `own_namespace`, so the two namespaces are
/// assumed to address classes at the same depth.
pub fn foreign_class_id(class_id: &str, own_namespace: &str, foreign_namespace: &str) -> String {
    class_id::join(
        foreign_namespace,
        class_id::strip_namespace(class_id, own_namespace),
    )
}

/// Try every alias of `loader` for `class_id`; first success wins.
///
/// The foreign loader resolves without its own aliases, bounding delegation
/// to a single hop. The foreign identifier joins the in-flight stack while it
/// resolves, so a cycle entered from either side fails fast.
pub(crate) fn resolve_alias(
    loader: &Loader,
    class_id: &str,
    cx: &mut LoadContext<'_>,
) -> Result<bool, AutoloadError> {
    let own_namespace = loader.namespace();
    if class_id == own_namespace || !class_id::is_under_namespace(class_id, own_namespace) {
        return Ok(false);
    }

    let host = cx.host();
    for (foreign_namespace, foreign) in loader.aliases().entries() {
        let foreign_class = foreign_class_id(class_id, own_namespace, &foreign_namespace);
        if foreign_class == class_id {
            continue;
        }

        if !host.is_defined(&foreign_class) {
            cx.enter(&foreign_class)?;
            let resolved = foreign.resolve_without_aliases(&foreign_class, cx);
            cx.leave();
            if !resolved? {
                continue;
            }
            if !host.is_defined(&foreign_class) {
                tracing::warn!(
                    class = class_id,
                    foreign = %foreign_class,
                    "alias target loaded without defining the foreign class"
                );
                continue;
            }
        }

        host.define_alias(&foreign_class, class_id)?;
        tracing::debug!(class = class_id, foreign = %foreign_class, "registered alias");
        return Ok(true);
    }
    Ok(false)
}
