//! Configuration errors.

use autoload_kernel::AutoloadError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Only `.toml` and `.json` files are understood.
    #[error("unsupported config format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid namespace {namespace:?} in {field}")]
    InvalidNamespace { namespace: String, field: String },

    #[error("alias {namespace:?} in package {package:?} targets undeclared package {target:?}")]
    UnknownAliasTarget {
        package: String,
        namespace: String,
        target: String,
    },

    #[error(transparent)]
    Autoload(#[from] AutoloadError),
}
