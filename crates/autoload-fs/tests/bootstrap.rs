//! End-to-end: a config file on disk, source files on disk, one registry.

use autoload_fs::{ConfigError, FsHost, bootstrap};
use autoload_kernel::{AutoloadError, ClassHost, HookStack, HostError, Registry};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const CONFIG: &str = r#"
[[package]]
namespace = "Fuel\\Core"
base_path = "core"

[package.classes]
"Fuel\\Core\\Session" = "patches/session.src"

[[package]]
namespace = "App"
base_path = "app"
strategy = "psr0"

[[package.alias]]
namespace = "Fuel\\Core"
loader = "Fuel\\Core"
"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project() -> (tempfile::TempDir, Arc<FsHost>, Registry) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "autoload.toml", CONFIG);
    write(root, "core/classes/config.src", "init Fuel\\Core\\Config\n");
    write(root, "core/classes/model/crud.src", "class Fuel\\Core\\Model_Crud\n");
    write(root, "patches/session.src", "class Fuel\\Core\\Session\n");
    write(
        root,
        "app/classes/Controller/Welcome.src",
        "# welcome page\nuses Fuel\\Core\\Model_Crud\ninit App\\Controller\\Welcome\n",
    );
    write(root, "app/classes/Broken.src", "function App\\Broken\n");

    let host = Arc::new(FsHost::new());
    let registry = bootstrap(&root.join("autoload.toml"), Arc::clone(&host) as Arc<dyn ClassHost>)
        .unwrap();
    (dir, host, registry)
}

#[test]
fn nested_reference_loads_without_initializing() {
    let (dir, host, registry) = project();

    assert!(registry.load("App\\Controller\\Welcome").unwrap());
    assert!(host.is_defined("Fuel\\Core\\Model_Crud"));
    assert_eq!(host.initialized(), vec!["App\\Controller\\Welcome"]);
    assert_eq!(
        host.loaded_files(),
        vec![
            dir.path().join("core/classes/model/crud.src"),
            dir.path().join("app/classes/Controller/Welcome.src"),
        ]
    );
}

#[test]
fn aliased_class_shares_the_core_initializer() {
    let (_dir, host, registry) = project();

    assert!(registry.load("App\\Config").unwrap());
    assert_eq!(host.canonical("App\\Config").as_deref(), Some("Fuel\\Core\\Config"));
    assert_eq!(host.initialized(), vec!["Fuel\\Core\\Config"]);

    assert!(registry.load("Fuel\\Core\\Config").unwrap());
    assert_eq!(host.initialized(), vec!["Fuel\\Core\\Config"]);
    assert_eq!(host.loaded_files().len(), 1);
}

#[test]
fn override_table_wins_over_the_convention() {
    let (dir, host, registry) = project();

    assert!(registry.load("\\Fuel\\Core\\Session").unwrap());
    assert_eq!(host.loaded_files(), vec![dir.path().join("patches/session.src")]);
}

#[test]
fn definer_failures_surface_as_errors_and_false_through_the_hook() {
    let (dir, host, registry) = project();

    assert!(!registry.load("App\\Nowhere").unwrap());

    let err = registry.load("App\\Broken").unwrap_err();
    assert!(matches!(err, AutoloadError::Host(HostError::Define { .. })));
    assert!(!registry.ledger().contains(&dir.path().join("app/classes/Broken.src")));

    let registry = Arc::new(registry);
    let mut hooks = HookStack::new();
    registry.register(&mut hooks);
    assert!(!hooks.resolve("App\\Broken"));
    assert!(hooks.resolve("Fuel\\Core\\Session"));
    assert!(!host.is_defined("App\\Broken"));
}

#[test]
fn json_config_and_initializer_hook() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "autoload.json",
        r#"{
            "dispatch": { "stop_on_first_match": true },
            "package": [
                { "namespace": "Shop", "base_path": "shop", "extension": "txt" }
            ]
        }"#,
    );
    write(root, "shop/classes/basket/item.txt", "init Shop\\Basket_Item\n");

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let host = Arc::new(FsHost::new().on_initialize(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    let registry =
        bootstrap(&root.join("autoload.json"), Arc::clone(&host) as Arc<dyn ClassHost>).unwrap();

    assert!(registry.load("Shop\\Basket_Item").unwrap());
    assert!(registry.load("Shop\\Basket_Item").unwrap());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_config_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = bootstrap(
        &dir.path().join("absent.toml"),
        Arc::new(FsHost::new()) as Arc<dyn ClassHost>,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
