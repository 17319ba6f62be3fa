//! In-memory host.
//!
//! Files are [`SourceUnit`] declarations keyed by path: which classes a file
//! defines, which classes it references while being defined, and which of
//! its classes expose an initializer. Load and initializer counters make the
//! kernel's once-only guarantees observable.

use crate::context::LoadContext;
use crate::error::{AutoloadError, HostError};
use crate::host::ClassHost;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Declarative contents of one in-memory source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceUnit {
    defines: Vec<String>,
    references: Vec<String>,
    initializers: Vec<String>,
}

impl SourceUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// The file defines `class_id`.
    pub fn defines(mut self, class_id: impl Into<String>) -> Self {
        self.defines.push(class_id.into());
        self
    }

    /// Defining the file requires `class_id` (e.g. a parent class).
    pub fn references(mut self, class_id: impl Into<String>) -> Self {
        self.references.push(class_id.into());
        self
    }

    /// The file defines `class_id`, which exposes an initializer.
    pub fn initialized(mut self, class_id: impl Into<String>) -> Self {
        let class_id = class_id.into();
        self.defines.push(class_id.clone());
        self.initializers.push(class_id);
        self
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<PathBuf, SourceUnit>,
    // identifier -> canonical identifier (aliases point at their original)
    symbols: HashMap<String, String>,
    initializers: HashSet<String>,
    load_counts: HashMap<PathBuf, usize>,
    init_log: Vec<String>,
}

/// A [`ClassHost`] backed entirely by memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, unit: SourceUnit) {
        self.state.lock().files.insert(path.into(), unit);
    }

    /// Define a class without loading any file.
    pub fn define(&self, class_id: impl Into<String>) {
        let class_id = class_id.into();
        self.state.lock().symbols.insert(class_id.clone(), class_id);
    }

    /// How many times `path` was handed to `load_source`.
    pub fn load_count(&self, path: impl AsRef<Path>) -> usize {
        self.state
            .lock()
            .load_counts
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.state.lock().load_counts.values().sum()
    }

    /// The identifier `class_id` resolves to, following aliases.
    pub fn canonical(&self, class_id: &str) -> Option<String> {
        self.state.lock().symbols.get(class_id).cloned()
    }

    /// How many times the initializer of `class_id`'s canonical class ran.
    pub fn init_count(&self, class_id: &str) -> usize {
        let state = self.state.lock();
        let Some(canonical) = state.symbols.get(class_id) else {
            return 0;
        };
        state
            .init_log
            .iter()
            .filter(|ran| *ran == canonical)
            .count()
    }

    /// Canonical classes whose initializer ran, in order.
    pub fn init_log(&self) -> Vec<String> {
        self.state.lock().init_log.clone()
    }
}

impl ClassHost for MemoryHost {
    fn file_exists(&self, path: &Path) -> bool {
        self.state.lock().files.contains_key(path)
    }

    fn load_source(&self, path: &Path, cx: &mut LoadContext<'_>) -> Result<(), AutoloadError> {
        let unit = {
            let mut state = self.state.lock();
            let unit = state.files.get(path).cloned().ok_or_else(|| HostError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })?;
            *state.load_counts.entry(path.to_path_buf()).or_default() += 1;
            unit
        };

        // The lock is released here: referenced classes re-enter the host.
        for reference in &unit.references {
            if !cx.load(reference)? {
                return Err(HostError::Define {
                    path: path.to_path_buf(),
                    message: format!("unresolved reference {reference}"),
                }
                .into());
            }
        }

        let mut state = self.state.lock();
        for class_id in &unit.defines {
            state.symbols.insert(class_id.clone(), class_id.clone());
        }
        state.initializers.extend(unit.initializers.iter().cloned());
        Ok(())
    }

    fn is_defined(&self, class_id: &str) -> bool {
        self.state.lock().symbols.contains_key(class_id)
    }

    fn define_alias(&self, original: &str, alias: &str) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let canonical =
            state
                .symbols
                .get(original)
                .cloned()
                .ok_or_else(|| HostError::UndefinedClass {
                    original: original.to_string(),
                    alias: alias.to_string(),
                })?;
        state.symbols.insert(alias.to_string(), canonical);
        Ok(())
    }

    fn initialize(&self, class_id: &str) -> bool {
        let mut state = self.state.lock();
        let Some(canonical) = state.symbols.get(class_id).cloned() else {
            return false;
        };
        if !state.initializers.contains(&canonical) {
            return false;
        }
        state.init_log.push(canonical);
        true
    }
}
