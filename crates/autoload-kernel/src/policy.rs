//! Dispatch policy: which loaders see a request, and when probing stops.

use crate::class_id;
use serde::{Deserialize, Serialize};

/// Rule deciding whether a loader is consulted for a class identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Consult a loader only for identifiers under its namespace.
    #[default]
    NamespacePrefix,
    /// Consult a loader only for identifiers that do NOT start with its
    /// namespace, compared as raw bytes. Kept for compatibility with
    /// registries written against the inverted check.
    LegacyInverted,
}

/// Whether the loader registered for `loader_namespace` may attempt
/// `class_id` under `rule`.
pub fn loader_is_eligible(class_id: &str, loader_namespace: &str, rule: Eligibility) -> bool {
    match rule {
        Eligibility::NamespacePrefix => class_id::is_under_namespace(class_id, loader_namespace),
        Eligibility::LegacyInverted => !class_id.starts_with(loader_namespace),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchPolicy {
    /// Stop probing loaders after the first one that succeeds. When false,
    /// every eligible loader is probed even after a success.
    pub stop_on_first_match: bool,
    pub eligibility: Eligibility,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            stop_on_first_match: true,
            eligibility: Eligibility::NamespacePrefix,
        }
    }
}

impl DispatchPolicy {
    /// The behaviour of the registry this design descends from: inverted
    /// eligibility, no short-circuit.
    pub fn legacy() -> Self {
        Self {
            stop_on_first_match: false,
            eligibility: Eligibility::LegacyInverted,
        }
    }
}
