//! Class identifier helpers.
//!
//! A class identifier is a namespaced name such as `Fuel\Core\Config`. The
//! kernel never validates identifiers: malformed input flows through the
//! string operations below unchanged.

/// Separator between namespace segments.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// Strip a single leading separator (`\App\Foo` -> `App\Foo`).
pub fn normalize(class_id: &str) -> &str {
    class_id
        .strip_prefix(NAMESPACE_SEPARATOR)
        .unwrap_or(class_id)
}

/// Whether `class_id` lies under `namespace` on a segment boundary.
///
/// The empty namespace is the global namespace and contains everything.
pub fn is_under_namespace(class_id: &str, namespace: &str) -> bool {
    if namespace.is_empty() {
        return true;
    }
    match class_id.strip_prefix(namespace) {
        Some("") => true,
        Some(rest) => rest.starts_with(NAMESPACE_SEPARATOR),
        None => false,
    }
}

/// The part of `class_id` after `namespace`, without the joining separator.
///
/// Identifiers outside the namespace are returned whole (minus a leading
/// separator).
pub fn strip_namespace<'a>(class_id: &'a str, namespace: &str) -> &'a str {
    let rest = class_id.strip_prefix(namespace).unwrap_or(class_id);
    normalize(rest)
}

/// Join a namespace and a relative class name.
pub fn join(namespace: &str, relative: &str) -> String {
    let relative = normalize(relative);
    if namespace.is_empty() {
        return relative.to_string();
    }
    if relative.is_empty() {
        return namespace.to_string();
    }
    format!("{namespace}{NAMESPACE_SEPARATOR}{relative}")
}
