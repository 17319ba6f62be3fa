//! A [`ClassHost`] backed by the real filesystem.

use crate::definer::{DeclarationDefiner, SourceDefiner};
use autoload_kernel::{AutoloadError, ClassHost, HostError, LoadContext};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callback run after a class's initializer is triggered.
pub type InitHook = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Default)]
struct SymbolTable {
    /// Every known identifier mapped to the class it names.
    symbols: HashMap<String, String>,
    initializers: HashSet<String>,
    initialized: Vec<String>,
    loaded_files: Vec<PathBuf>,
}

/// Reads source files from disk and hands their contents to a
/// [`SourceDefiner`].
pub struct FsHost<D = DeclarationDefiner> {
    definer: D,
    table: Mutex<SymbolTable>,
    on_initialize: Option<InitHook>,
}

impl FsHost<DeclarationDefiner> {
    pub fn new() -> Self {
        Self::with_definer(DeclarationDefiner)
    }
}

impl Default for FsHost<DeclarationDefiner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: SourceDefiner> FsHost<D> {
    pub fn with_definer(definer: D) -> Self {
        Self {
            definer,
            table: Mutex::new(SymbolTable::default()),
            on_initialize: None,
        }
    }

    /// Run `hook` every time an initializer fires. The hook may request
    /// further classes.
    pub fn on_initialize(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_initialize = Some(Arc::new(hook));
        self
    }

    pub fn definer(&self) -> &D {
        &self.definer
    }

    /// The class `class_id` names, following aliases.
    pub fn canonical(&self, class_id: &str) -> Option<String> {
        self.table.lock().symbols.get(class_id).cloned()
    }

    /// Classes whose initializer ran, in order.
    pub fn initialized(&self) -> Vec<String> {
        self.table.lock().initialized.clone()
    }

    /// Files read so far, in load order.
    pub fn loaded_files(&self) -> Vec<PathBuf> {
        self.table.lock().loaded_files.clone()
    }
}

impl<D: SourceDefiner> ClassHost for FsHost<D> {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load_source(&self, path: &Path, cx: &mut LoadContext<'_>) -> Result<(), AutoloadError> {
        let source = std::fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let definitions = self.definer.define(path, &source, cx)?;

        let mut table = self.table.lock();
        table.loaded_files.push(path.to_path_buf());
        for class_id in definitions.classes {
            if table.symbols.contains_key(&class_id) {
                tracing::warn!(class = %class_id, path = %path.display(), "class already defined, keeping the first definition");
                continue;
            }
            table.symbols.insert(class_id.clone(), class_id);
        }
        table.initializers.extend(definitions.initializers);
        tracing::trace!(path = %path.display(), symbols = table.symbols.len(), "source defined");
        Ok(())
    }

    fn is_defined(&self, class_id: &str) -> bool {
        self.table.lock().symbols.contains_key(class_id)
    }

    fn define_alias(&self, original: &str, alias: &str) -> Result<(), HostError> {
        let mut table = self.table.lock();
        let canonical = table
            .symbols
            .get(original)
            .cloned()
            .ok_or_else(|| HostError::UndefinedClass {
                original: original.to_string(),
                alias: alias.to_string(),
            })?;
        table.symbols.insert(alias.to_string(), canonical);
        Ok(())
    }

    fn initialize(&self, class_id: &str) -> bool {
        let canonical = {
            let mut table = self.table.lock();
            let Some(canonical) = table.symbols.get(class_id).cloned() else {
                return false;
            };
            if !table.initializers.contains(&canonical) || table.initialized.contains(&canonical) {
                return false;
            }
            table.initialized.push(canonical.clone());
            canonical
        };
        if let Some(hook) = &self.on_initialize {
            hook(&canonical);
        }
        true
    }
}

impl<D: fmt::Debug> fmt::Debug for FsHost<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.lock();
        f.debug_struct("FsHost")
            .field("definer", &self.definer)
            .field("symbols", &table.symbols.len())
            .field("initialized", &table.initialized)
            .finish()
    }
}
