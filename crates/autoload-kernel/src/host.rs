//! Capabilities the kernel consumes from its host runtime.
//!
//! The kernel decides *which* file to hand over and *when*. Everything about
//! what a file contains, and how it becomes program symbols, stays behind
//! [`ClassHost`].

use crate::context::LoadContext;
use crate::error::{AutoloadError, HostError};
use std::path::Path;

/// The host runtime as seen by loaders and the registry.
pub trait ClassHost: Send + Sync {
    /// Whether a file exists at `path`.
    fn file_exists(&self, path: &Path) -> bool;

    /// Read the file at `path` and define the symbols it contains.
    ///
    /// Classes referenced while defining the file must be requested through
    /// `cx.load(..)` so that they stay part of the same top-level request;
    /// errors from those nested loads propagate unchanged.
    fn load_source(&self, path: &Path, cx: &mut LoadContext<'_>) -> Result<(), AutoloadError>;

    /// Whether `class_id` is currently defined (directly or as an alias).
    fn is_defined(&self, class_id: &str) -> bool;

    /// Register `alias` as a transparent synonym of the defined `original`.
    fn define_alias(&self, original: &str, alias: &str) -> Result<(), HostError>;

    /// Run the zero-argument initializer of `class_id`, if it exposes one.
    ///
    /// Returns whether an initializer ran.
    fn initialize(&self, class_id: &str) -> bool;
}
