//! Call-stack-scoped resolution state.
//!
//! Every top-level [`Registry::load`](crate::Registry::load) call creates one
//! [`LoadContext`] and threads it through loaders, custom resolvers and the
//! host's `load_source`. Nested loads requested through the context belong to
//! the same top-level request: they never fire an initializer, and a nested
//! request for an identifier (or a file) that is still in flight fails fast
//! instead of recursing without bound.

use crate::class_id;
use crate::error::AutoloadError;
use crate::host::ClassHost;
use crate::registry::Registry;
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
struct LedgerState {
    loaded: IndexSet<PathBuf>,
    pending: IndexSet<PathBuf>,
}

/// Where a file stands when a load of it begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    Started,
    Loaded,
    Pending,
}

/// Every file the host finished defining, in completion order, plus the
/// files whose `load_source` is still running.
///
/// A loaded file is never handed over a second time.
#[derive(Debug, Default)]
pub struct LoadLedger {
    state: Mutex<LedgerState>,
}

impl LoadLedger {
    /// Whether `path` was loaded successfully.
    pub fn contains(&self, path: &Path) -> bool {
        self.state.lock().loaded.contains(path)
    }

    /// Whether `path` is being defined right now.
    pub fn is_pending(&self, path: &Path) -> bool {
        self.state.lock().pending.contains(path)
    }

    pub fn len(&self) -> usize {
        self.state.lock().loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().loaded.is_empty()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.state.lock().loaded.iter().cloned().collect()
    }

    fn claim(&self, path: &Path) -> Claim {
        let mut state = self.state.lock();
        if state.loaded.contains(path) {
            Claim::Loaded
        } else if !state.pending.insert(path.to_path_buf()) {
            Claim::Pending
        } else {
            Claim::Started
        }
    }

    fn finish(&self, path: &Path) {
        let mut state = self.state.lock();
        state.pending.shift_remove(path);
        state.loaded.insert(path.to_path_buf());
    }

    fn abandon(&self, path: &Path) {
        self.state.lock().pending.shift_remove(path);
    }
}

/// Per-request resolution state passed down the resolution call chain.
pub struct LoadContext<'a> {
    host: &'a dyn ClassHost,
    ledger: &'a LoadLedger,
    registry: Option<&'a Registry>,
    in_flight: Vec<String>,
    files_loaded: usize,
}

impl<'a> LoadContext<'a> {
    pub(crate) fn top_level(registry: &'a Registry) -> Self {
        Self {
            host: registry.host(),
            ledger: registry.ledger(),
            registry: Some(registry),
            in_flight: Vec::new(),
            files_loaded: 0,
        }
    }

    /// A context not attached to any registry.
    ///
    /// Lets a [`Loader`](crate::Loader) resolve on its own; nested loads
    /// requested through it report `false`.
    pub fn detached(host: &'a dyn ClassHost, ledger: &'a LoadLedger) -> Self {
        Self {
            host,
            ledger,
            registry: None,
            in_flight: Vec::new(),
            files_loaded: 0,
        }
    }

    pub fn host(&self) -> &'a dyn ClassHost {
        self.host
    }

    pub fn ledger(&self) -> &'a LoadLedger {
        self.ledger
    }

    /// Files this request handed to the host that defined successfully.
    pub fn files_loaded(&self) -> usize {
        self.files_loaded
    }

    /// Identifiers currently being dispatched, outermost first.
    pub fn in_flight(&self) -> &[String] {
        &self.in_flight
    }

    pub fn depth(&self) -> usize {
        self.in_flight.len()
    }

    /// Request a nested load as part of the current top-level request.
    pub fn load(&mut self, class_id: &str) -> Result<bool, AutoloadError> {
        let class_id = class_id::normalize(class_id);
        if self.host.is_defined(class_id) {
            return Ok(true);
        }
        match self.registry {
            Some(registry) => registry.dispatch(self, class_id),
            None => {
                tracing::trace!(class = class_id, "nested load without a registry");
                Ok(false)
            }
        }
    }

    /// Load `path` if it exists.
    ///
    /// Returns `Ok(false)` when the file is absent, and `Ok(true)` without
    /// touching the host when the file was loaded before.
    pub fn load_file(&mut self, path: &Path) -> Result<bool, AutoloadError> {
        if self.ledger.contains(path) {
            return Ok(true);
        }
        if !self.host.file_exists(path) {
            return Ok(false);
        }
        self.require_file(path)?;
        Ok(true)
    }

    /// Load `path` unconditionally; a missing file surfaces as a host error.
    ///
    /// Reaching a file that is still being defined further up the call
    /// stack is a [`RecursiveResolution`](AutoloadError::RecursiveResolution)
    /// naming the innermost in-flight identifier.
    pub fn require_file(&mut self, path: &Path) -> Result<(), AutoloadError> {
        match self.ledger.claim(path) {
            Claim::Loaded => return Ok(()),
            Claim::Pending => {
                let display = path.display().to_string();
                let class = self.in_flight.last().map_or(display.as_str(), String::as_str);
                return Err(AutoloadError::recursive(class, &self.in_flight));
            }
            Claim::Started => {}
        }
        let host = self.host;
        if let Err(err) = host.load_source(path, self) {
            self.ledger.abandon(path);
            return Err(err);
        }
        self.ledger.finish(path);
        self.files_loaded += 1;
        tracing::debug!(path = %path.display(), depth = self.depth(), "loaded source");
        Ok(())
    }

    pub(crate) fn enter(&mut self, class_id: &str) -> Result<(), AutoloadError> {
        if self.in_flight.iter().any(|active| active == class_id) {
            return Err(AutoloadError::recursive(class_id, &self.in_flight));
        }
        self.in_flight.push(class_id.to_string());
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.in_flight.pop();
    }
}

impl std::fmt::Debug for LoadContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadContext")
            .field("in_flight", &self.in_flight)
            .field("files_loaded", &self.files_loaded)
            .field("attached", &self.registry.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryHost, SourceUnit};

    #[test]
    fn detached_context_loads_each_file_once() {
        let host = MemoryHost::new();
        host.add_file("/app/a.src", SourceUnit::new().defines("App\\A"));
        let ledger = LoadLedger::default();
        let mut cx = LoadContext::detached(&host, &ledger);

        assert!(cx.load_file(Path::new("/app/a.src")).unwrap());
        assert!(cx.load_file(Path::new("/app/a.src")).unwrap());
        assert_eq!(host.load_count("/app/a.src"), 1);
        assert_eq!(cx.files_loaded(), 1);
        assert_eq!(ledger.files(), vec![PathBuf::from("/app/a.src")]);
    }

    #[test]
    fn file_still_being_defined_cannot_be_required_again() {
        let host = MemoryHost::new();
        host.add_file("/app/a.src", SourceUnit::new().defines("App\\A"));
        let path = Path::new("/app/a.src");
        let ledger = LoadLedger::default();
        assert_eq!(ledger.claim(path), Claim::Started);

        let mut cx = LoadContext::detached(&host, &ledger);
        cx.enter("App\\A").unwrap();
        let err = cx.require_file(path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "recursive resolution of App\\A (in flight: App\\A)"
        );
        assert!(cx.load_file(path).is_err());
        assert!(ledger.is_pending(path));
        assert!(!ledger.contains(path));
        assert_eq!(host.load_count(path), 0);

        ledger.finish(path);
        assert_eq!(ledger.claim(path), Claim::Loaded);
        assert!(cx.load_file(path).unwrap());
        assert_eq!(ledger.files(), vec![PathBuf::from("/app/a.src")]);
    }

    #[test]
    fn missing_file_is_not_an_error_for_load_file() {
        let host = MemoryHost::new();
        let ledger = LoadLedger::default();
        let mut cx = LoadContext::detached(&host, &ledger);
        assert!(!cx.load_file(Path::new("/nope.src")).unwrap());
        assert!(ledger.is_empty());
    }

    #[test]
    fn failed_require_is_not_recorded() {
        let host = MemoryHost::new();
        let ledger = LoadLedger::default();
        let mut cx = LoadContext::detached(&host, &ledger);
        let err = cx.require_file(Path::new("/nope.src")).unwrap_err();
        assert!(matches!(err, AutoloadError::Host(_)));
        assert!(!ledger.contains(Path::new("/nope.src")));
    }

    #[test]
    fn detached_nested_loads_report_false() {
        let host = MemoryHost::new();
        let ledger = LoadLedger::default();
        let mut cx = LoadContext::detached(&host, &ledger);
        assert!(!cx.load("App\\Missing").unwrap());
        assert_eq!(cx.files_loaded(), 0);
    }

    #[test]
    fn reentering_an_in_flight_identifier_fails() {
        let host = MemoryHost::new();
        let ledger = LoadLedger::default();
        let mut cx = LoadContext::detached(&host, &ledger);
        cx.enter("App\\A").unwrap();
        cx.enter("App\\B").unwrap();
        let err = cx.enter("App\\A").unwrap_err();
        assert!(matches!(err, AutoloadError::RecursiveResolution { .. }));
        cx.leave();
        cx.leave();
        assert_eq!(cx.depth(), 0);
    }
}
