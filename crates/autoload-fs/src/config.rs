//! Declarative bootstrap: packages, overrides and aliases from a TOML or
//! JSON file, wired into a [`Registry`].

use crate::error::ConfigError;
use autoload_kernel::{ClassHost, Convention, DispatchPolicy, Loader, LoaderConfig, Registry};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

fn namespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]*(?:\\[A-Za-z_][A-Za-z0-9_]*)*)?$")
            .expect("namespace regex must compile")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoloadConfig {
    #[serde(default)]
    pub dispatch: DispatchPolicy,
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageConfig>,
}

/// One namespace's loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    pub namespace: String,
    pub base_path: String,
    #[serde(default = "default_strategy")]
    pub strategy: Convention,
    #[serde(default)]
    pub extension: Option<String>,
    /// Extra search roots, appended after `base_path`.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Register ahead of the packages declared before this one.
    #[serde(default)]
    pub prepend: bool,
    /// Override table, applied in the order written.
    #[serde(default)]
    pub classes: IndexMap<String, String>,
    #[serde(default, rename = "alias")]
    pub aliases: Vec<AliasConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    /// Foreign namespace whose classes the package re-exports.
    pub namespace: String,
    /// Namespace of the package that resolves the foreign classes.
    pub loader: String,
}

fn default_strategy() -> Convention {
    Convention::Legacy
}

impl AutoloadConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read `path`, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = path.extension().and_then(|ext| ext.to_str());
        if !matches!(format, Some("toml" | "json")) {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        match format {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for package in &self.packages {
            check_namespace(&package.namespace, "package.namespace")?;
            for alias in &package.aliases {
                check_namespace(&alias.namespace, "package.alias.namespace")?;
                if !self.packages.iter().any(|p| p.namespace == alias.loader) {
                    return Err(ConfigError::UnknownAliasTarget {
                        package: package.namespace.clone(),
                        namespace: alias.namespace.clone(),
                        target: alias.loader.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Build a registry over `host`. Relative paths are resolved against
    /// `root`.
    pub fn build_registry(
        &self,
        host: Arc<dyn ClassHost>,
        root: &Path,
    ) -> Result<Registry, ConfigError> {
        self.validate()?;

        let mut loaders: IndexMap<&str, Arc<Loader>> = IndexMap::new();
        for package in &self.packages {
            let mut config = LoaderConfig::new(
                package.namespace.as_str(),
                resolve(root, &package.base_path),
                package.strategy.into(),
            );
            if let Some(extension) = &package.extension {
                config = config.with_extension(extension.as_str());
            }
            let loader = Loader::shared(config);
            loader.add_paths(package.paths.iter().map(|p| resolve(root, p)), None)?;
            loader.add_classes(
                package
                    .classes
                    .iter()
                    .map(|(class_id, path)| (class_id.as_str(), PathBuf::from(resolve(root, path)))),
            );
            loaders.insert(package.namespace.as_str(), loader);
        }

        for package in &self.packages {
            let Some(loader) = loaders.get(package.namespace.as_str()) else {
                continue;
            };
            for alias in &package.aliases {
                if let Some(target) = loaders.get(alias.loader.as_str()) {
                    loader.add_namespace_alias(alias.namespace.as_str(), Arc::clone(target));
                }
            }
        }

        let mut registry = Registry::with_policy(host, self.dispatch);
        for package in &self.packages {
            let Some(loader) = loaders.get(package.namespace.as_str()) else {
                continue;
            };
            registry.add_loaders([(package.namespace.as_str(), Arc::clone(loader))], package.prepend);
            tracing::debug!(
                namespace = %package.namespace,
                strategy = package.strategy.name(),
                prepend = package.prepend,
                "package registered"
            );
        }
        Ok(registry)
    }
}

/// Load the config at `path` and build its registry. Relative paths in the
/// file are taken from the file's directory.
pub fn bootstrap(path: &Path, host: Arc<dyn ClassHost>) -> Result<Registry, ConfigError> {
    let config = AutoloadConfig::load(path)?;
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    config.build_registry(host, root)
}

fn check_namespace(namespace: &str, field: &str) -> Result<(), ConfigError> {
    if namespace_re().is_match(namespace) {
        Ok(())
    } else {
        Err(ConfigError::InvalidNamespace {
            namespace: namespace.to_string(),
            field: field.to_string(),
        })
    }
}

fn resolve(root: &Path, path: &str) -> String {
    if Path::new(path).is_absolute() {
        path.to_string()
    } else {
        root.join(path).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoload_kernel::{Eligibility, MemoryHost};

    const SAMPLE: &str = r#"
[dispatch]
stop_on_first_match = false
eligibility = "legacy_inverted"

[[package]]
namespace = "Core"
base_path = "core"
paths = ["vendor/core"]

[package.classes]
"Core\\Special" = "patches/special.src"

[[package]]
namespace = "App"
base_path = "/srv/app"
strategy = "psr0"
extension = "cls"
prepend = true

[[package.alias]]
namespace = "Core"
loader = "Core"
"#;

    #[test]
    fn parses_toml() {
        let config = AutoloadConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.dispatch, DispatchPolicy::legacy());
        assert_eq!(config.packages.len(), 2);
        assert_eq!(config.packages[0].strategy, Convention::Legacy);
        assert_eq!(config.packages[1].strategy, Convention::Psr0);
        assert_eq!(config.packages[1].extension.as_deref(), Some("cls"));
        assert_eq!(
            config.packages[1].aliases,
            vec![AliasConfig {
                namespace: "Core".into(),
                loader: "Core".into()
            }]
        );
    }

    #[test]
    fn json_and_toml_agree() {
        let json = r#"{
            "package": [
                { "namespace": "Core", "base_path": "core" }
            ]
        }"#;
        let from_json = AutoloadConfig::from_json_str(json).unwrap();
        let from_toml =
            AutoloadConfig::from_toml_str("[[package]]\nnamespace = \"Core\"\nbase_path = \"core\"\n")
                .unwrap();
        assert_eq!(from_json, from_toml);
        assert_eq!(from_json.dispatch, DispatchPolicy::default());
    }

    #[test]
    fn override_entries_keep_their_written_order() {
        let from_toml = AutoloadConfig::from_toml_str(
            "[[package]]\nnamespace = \"Core\"\nbase_path = \"core\"\n\n[package.classes]\n\"Core\\\\Zeta\" = \"z.src\"\n\"Core\\\\Alpha\" = \"a.src\"\n",
        )
        .unwrap();
        let from_json = AutoloadConfig::from_json_str(
            r#"{"package": [{"namespace": "Core", "base_path": "core",
                "classes": {"Core\\Zeta": "z.src", "Core\\Alpha": "a.src"}}]}"#,
        )
        .unwrap();

        for config in [&from_toml, &from_json] {
            let keys: Vec<&str> = config.packages[0].classes.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["Core\\Zeta", "Core\\Alpha"]);
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AutoloadConfig::from_toml_str(
            "[[package]]\nnamespace = \"Core\"\nbase_path = \"core\"\nbasepath = \"x\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));

        let err = AutoloadConfig::from_toml_str("[dispatch]\nshort_circuit = true\n").unwrap_err();
        assert!(err.to_string().contains("short_circuit"));
    }

    #[test]
    fn namespaces_are_validated() {
        assert!(check_namespace("", "ns").is_ok());
        assert!(check_namespace("Fuel\\Core", "ns").is_ok());
        assert!(check_namespace("Fuel\\", "ns").is_err());
        assert!(check_namespace("\\Fuel", "ns").is_err());
        assert!(check_namespace("Fuel/Core", "ns").is_err());
        assert!(check_namespace("9Lives", "ns").is_err());

        let config = AutoloadConfig::from_toml_str(
            "[[package]]\nnamespace = \"Bad-Name\"\nbase_path = \"x\"\n",
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid namespace \"Bad-Name\" in package.namespace"
        );
    }

    #[test]
    fn alias_target_must_be_declared() {
        let config = AutoloadConfig::from_toml_str(
            "[[package]]\nnamespace = \"App\"\nbase_path = \"app\"\n\n[[package.alias]]\nnamespace = \"Core\"\nloader = \"Core\"\n",
        )
        .unwrap();
        let err = config
            .build_registry(Arc::new(MemoryHost::new()), Path::new("/srv"))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownAliasTarget { ref target, .. } if target == "Core"
        ));
    }

    #[test]
    fn builds_a_wired_registry() {
        let config = AutoloadConfig::from_toml_str(SAMPLE).unwrap();
        let registry = config
            .build_registry(Arc::new(MemoryHost::new()), Path::new("/srv"))
            .unwrap();

        assert_eq!(registry.namespaces(), vec!["App", "Core"]);
        assert_eq!(registry.policy().eligibility, Eligibility::LegacyInverted);

        let core = registry.namespace_loader("Core").unwrap();
        assert_eq!(
            core.search_paths().as_slice(),
            &["/srv/core/".to_string(), "/srv/vendor/core/".to_string()]
        );
        assert_eq!(
            core.class_path("Core\\Special"),
            Some(PathBuf::from("/srv/patches/special.src"))
        );

        let app = registry.namespace_loader("App").unwrap();
        assert_eq!(app.base_path(), "/srv/app");
        assert_eq!(app.extension(), "cls");
        assert_eq!(app.aliases().namespaces(), vec!["Core"]);
    }

    #[test]
    fn unsupported_extension_is_rejected_before_reading() {
        let err = AutoloadConfig::load(Path::new("/nowhere/autoload.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }
}
