//! Naming conventions mapping a class identifier to a relative file path.

use crate::class_id::{self, NAMESPACE_SEPARATOR};
use crate::context::LoadContext;
use crate::error::AutoloadError;
use crate::loader::Loader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Subdirectory of every search root that holds class files.
pub const CLASSES_DIR: &str = "classes";

/// Extension used when a loader does not configure one.
pub const DEFAULT_EXTENSION: &str = "src";

/// A user-supplied resolver. Its boolean result is trusted as-is.
pub type CustomResolver =
    Arc<dyn Fn(&str, &Loader, &mut LoadContext<'_>) -> Result<bool, AutoloadError> + Send + Sync>;

/// Built-in path conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// Lowercased; separators become directories, and underscores in the
    /// final segment do too (`Model\Blog_Post` -> `model/blog/post`).
    Legacy,
    /// Case-preserving; separators and underscores become directories
    /// uniformly across the whole remainder.
    Psr0,
}

impl Convention {
    pub fn name(self) -> &'static str {
        match self {
            Convention::Legacy => "legacy",
            Convention::Psr0 => "psr0",
        }
    }

    /// Relative path (no extension) for `class_id` under `namespace`.
    pub fn derive(self, namespace: &str, class_id: &str) -> String {
        let remainder = class_id::strip_namespace(class_id, namespace);
        match self {
            Convention::Legacy => derive_legacy(remainder),
            Convention::Psr0 => remainder.replace([NAMESPACE_SEPARATOR, '_'], "/"),
        }
    }
}

fn derive_legacy(remainder: &str) -> String {
    let (dirs, last) = match remainder.rsplit_once(NAMESPACE_SEPARATOR) {
        Some((dirs, last)) => (Some(dirs), last),
        None => (None, remainder),
    };
    let last = last.replace('_', "/");
    let path = match dirs {
        Some(dirs) => format!("{}/{last}", dirs.replace(NAMESPACE_SEPARATOR, "/")),
        None => last,
    };
    path.to_lowercase()
}

/// How a loader turns an identifier into a file.
#[derive(Clone)]
pub enum PathStrategy {
    Legacy,
    Psr0,
    Custom(CustomResolver),
}

impl PathStrategy {
    pub fn custom<F>(resolver: F) -> Self
    where
        F: Fn(&str, &Loader, &mut LoadContext<'_>) -> Result<bool, AutoloadError>
            + Send
            + Sync
            + 'static,
    {
        PathStrategy::Custom(Arc::new(resolver))
    }

    pub fn convention(&self) -> Option<Convention> {
        match self {
            PathStrategy::Legacy => Some(Convention::Legacy),
            PathStrategy::Psr0 => Some(Convention::Psr0),
            PathStrategy::Custom(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PathStrategy::Legacy => "legacy",
            PathStrategy::Psr0 => "psr0",
            PathStrategy::Custom(_) => "custom",
        }
    }
}

impl From<Convention> for PathStrategy {
    fn from(convention: Convention) -> Self {
        match convention {
            Convention::Legacy => PathStrategy::Legacy,
            Convention::Psr0 => PathStrategy::Psr0,
        }
    }
}

impl fmt::Debug for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
