//! # Autoload Kernel
//!
//! Resolves a symbolic class identifier (`Fuel\Core\Config`) to a source file
//! and makes sure that file is handed to the host exactly once, with an
//! optional one-shot initializer for the requested class.
//!
//! This crate is **host-agnostic**: it never reads files itself. The host
//! supplies the capabilities in [`ClassHost`] and installs the registry's
//! `load` into its resolution hook chain.
//!
//! ## Architecture
//!
//! ```text
//! Registry            ← ordered namespace -> Loader map, single `load` entry
//!     │
//! LoadContext         ← per-request state: in-flight stack, files loaded
//!     │
//! Loader              ← override table → alias table → path strategy
//!     │
//! PathStrategy        ← Legacy | Psr0 | Custom(resolver)
//!     │
//! ClassHost           ← file_exists, load_source, define_alias, initialize
//! ```

pub mod alias;
pub mod class_id;
pub mod context;
pub mod error;
pub mod hook;
pub mod host;
pub mod loader;
pub mod memory;
pub mod policy;
pub mod registry;
pub mod search_path;
pub mod strategy;

pub use alias::AliasTable;
pub use context::{LoadContext, LoadLedger};
pub use error::{AutoloadError, HostError};
pub use hook::{HookChain, HookStack, ResolveFn};
pub use host::ClassHost;
pub use loader::{Loader, LoaderConfig};
pub use memory::{MemoryHost, SourceUnit};
pub use policy::{DispatchPolicy, Eligibility, loader_is_eligible};
pub use registry::{LoaderSnapshot, Registry, RegistrySnapshot};
pub use search_path::SearchPaths;
pub use strategy::{Convention, CustomResolver, PathStrategy};
