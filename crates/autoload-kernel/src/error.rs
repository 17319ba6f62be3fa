//! Error types for autoload kernel operations.
//!
//! "Nothing matched" is not an error: resolution reports it as `Ok(false)`.
//! The variants here cover caller misuse and capability failures only.

use std::path::PathBuf;

/// Failures raised by the host capabilities (file loading, symbol aliasing).
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The source file could not be read or opened.
    #[error("failed to load source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An alias was requested for a class that is not defined.
    #[error("cannot alias {alias} to undefined class {original}")]
    UndefinedClass { original: String, alias: String },

    /// The source was read but could not be turned into symbols.
    #[error("cannot define symbols from {}: {message}", path.display())]
    Define { path: PathBuf, message: String },
}

/// Errors arising from autoload configuration misuse or failed loads.
#[derive(Debug, thiserror::Error)]
pub enum AutoloadError {
    /// A search path was inserted at a position outside the list.
    #[error("cannot add path: position {position} is out of range (len {len})")]
    PositionOutOfRange { position: i64, len: usize },

    /// A class identifier was requested again while its own resolution
    /// was still in flight on the same call stack.
    #[error("recursive resolution of {class} (in flight: {stack})")]
    RecursiveResolution { class: String, stack: String },

    #[error(transparent)]
    Host(#[from] HostError),
}

impl AutoloadError {
    pub(crate) fn recursive(class: &str, stack: &[String]) -> Self {
        Self::RecursiveResolution {
            class: class.to_string(),
            stack: stack.join(" -> "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursive_error_lists_the_in_flight_stack() {
        let err = AutoloadError::recursive("App\\A", &["App\\A".into(), "App\\B".into()]);
        assert_eq!(
            err.to_string(),
            "recursive resolution of App\\A (in flight: App\\A -> App\\B)"
        );
    }

    #[test]
    fn host_errors_convert_transparently() {
        let err: AutoloadError = HostError::UndefinedClass {
            original: "Core\\Foo".into(),
            alias: "App\\Foo".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "cannot alias App\\Foo to undefined class Core\\Foo"
        );
    }
}
