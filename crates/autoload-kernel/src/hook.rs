//! The host's module-resolution hook slot.

use std::fmt;
use std::sync::Arc;

/// A resolution callback: given an unresolved identifier, report success.
pub type ResolveFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Somewhere a host keeps its ordered resolution callbacks.
pub trait HookChain {
    /// Install `resolver` at the lowest priority.
    fn append(&mut self, resolver: ResolveFn);

    /// Install `resolver` ahead of every existing callback.
    fn prepend(&mut self, resolver: ResolveFn);
}

/// Ordered resolution callbacks; the first success stops the walk.
#[derive(Clone, Default)]
pub struct HookStack {
    resolvers: Vec<ResolveFn>,
}

impl HookStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, class_id: &str) -> bool {
        self.resolvers.iter().any(|resolver| resolver(class_id))
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl HookChain for HookStack {
    fn append(&mut self, resolver: ResolveFn) {
        self.resolvers.push(resolver);
    }

    fn prepend(&mut self, resolver: ResolveFn) {
        self.resolvers.insert(0, resolver);
    }
}

impl fmt::Debug for HookStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookStack")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}
