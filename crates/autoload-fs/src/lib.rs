//! # Autoload FS
//!
//! Filesystem host for the autoload kernel, plus declarative bootstrap.
//!
//! - [`FsHost`] reads source files with `std::fs` and hands their contents
//!   to a [`SourceDefiner`].
//! - [`AutoloadConfig`] describes packages, override tables and aliases in
//!   TOML or JSON and builds a wired [`Registry`](autoload_kernel::Registry).

pub mod config;
pub mod definer;
pub mod error;
pub mod fs_host;

pub use config::{AliasConfig, AutoloadConfig, PackageConfig, bootstrap};
pub use definer::{DeclarationDefiner, Definitions, SourceDefiner};
pub use error::ConfigError;
pub use fs_host::{FsHost, InitHook};
