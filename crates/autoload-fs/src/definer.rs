//! Turning file contents into defined symbols.

use autoload_kernel::{AutoloadError, HostError, LoadContext};
use std::path::Path;

/// Symbols produced by defining one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definitions {
    pub classes: Vec<String>,
    /// Classes among `classes` that expose an initializer.
    pub initializers: Vec<String>,
}

/// The host's "source -> symbols" mechanism.
///
/// Classes the source needs while being defined are requested through
/// `cx.load(..)`.
pub trait SourceDefiner: Send + Sync {
    fn define(
        &self,
        path: &Path,
        source: &str,
        cx: &mut LoadContext<'_>,
    ) -> Result<Definitions, AutoloadError>;
}

/// Line-oriented declarations, one directive per line:
///
/// ```text
/// # comment
/// uses Fuel\Core\Model    # must resolve before the file is defined
/// class App\Model\User    # defines a class
/// init App\Bootstrap      # defines a class that exposes an initializer
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationDefiner;

impl SourceDefiner for DeclarationDefiner {
    fn define(
        &self,
        path: &Path,
        source: &str,
        cx: &mut LoadContext<'_>,
    ) -> Result<Definitions, AutoloadError> {
        let mut definitions = Definitions::default();
        for (line_no, line) in source.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let define_error = |message: String| HostError::Define {
                path: path.to_path_buf(),
                message: format!("line {}: {message}", line_no + 1),
            };
            let (directive, class_id) = line
                .split_once(char::is_whitespace)
                .map(|(directive, rest)| (directive, rest.trim()))
                .ok_or_else(|| define_error(format!("missing class name after {line:?}")))?;
            let class_id = autoload_kernel::class_id::normalize(class_id).to_string();

            match directive {
                "uses" => {
                    if !cx.load(&class_id)? {
                        return Err(define_error(format!("unresolved reference {class_id}")).into());
                    }
                }
                "class" => definitions.classes.push(class_id),
                "init" => {
                    definitions.classes.push(class_id.clone());
                    definitions.initializers.push(class_id);
                }
                other => return Err(define_error(format!("unknown directive {other:?}")).into()),
            }
        }
        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoload_kernel::{LoadLedger, MemoryHost};

    fn define(source: &str) -> Result<Definitions, AutoloadError> {
        let host = MemoryHost::new();
        host.define("Core\\Model");
        let ledger = LoadLedger::default();
        let mut cx = LoadContext::detached(&host, &ledger);
        DeclarationDefiner.define(Path::new("/app/user.src"), source, &mut cx)
    }

    #[test]
    fn parses_directives_and_comments() {
        let defs = define(
            "# user model\nuses \\Core\\Model\nclass App\\User  # trailing\ninit App\\Boot\n\n",
        )
        .unwrap();
        assert_eq!(defs.classes, vec!["App\\User", "App\\Boot"]);
        assert_eq!(defs.initializers, vec!["App\\Boot"]);
    }

    #[test]
    fn unresolved_reference_names_the_line() {
        let err = define("class App\\A\nuses App\\Missing\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot define symbols from /app/user.src: line 2: unresolved reference App\\Missing"
        );
    }

    #[test]
    fn unknown_directive_is_rejected() {
        let err = define("struct App\\A").unwrap_err();
        assert!(err.to_string().contains("unknown directive \"struct\""));
    }

    #[test]
    fn directive_without_a_class_is_rejected() {
        let err = define("class").unwrap_err();
        assert!(err.to_string().contains("missing class name"));
    }
}
