//! Schema lookup contract.
//!
//! The engine never decides on its own where a preference may legally
//! live; it consults this contract during resolution, reconciliation, and
//! write validation. Schema population (default values, validation rules)
//! is a collaborator concern and stays outside the engine.

use std::collections::{HashMap, HashSet};

use crate::scope::Scope;

/// Scope-eligibility lookups consulted by the engine.
pub trait PreferenceSchema: Send + Sync {
    /// Whether `name` may hold a value at `scope`.
    fn is_valid_in_scope(&self, name: &str, scope: Scope) -> bool;

    /// All known preference names.
    fn preference_names(&self) -> Vec<String>;

    /// Whether `section` is reserved for workspace/folder configuration
    /// and must never be written to user-global settings.
    fn is_workspace_only_section(&self, section: &str) -> bool;
}

/// In-memory schema registry.
///
/// Each registered name carries the highest scope it may live in; the name
/// is valid at that scope and every scope below it. Unregistered names are
/// permitted everywhere so that container lookups (e.g. resolving
/// `"editor"` while walking the dotted path of `"editor.fontSize"`) are
/// not rejected.
///
/// # Example
///
/// ```
/// use pref_model::{PreferenceSchema, SchemaRegistry, Scope};
///
/// let mut schema = SchemaRegistry::new();
/// schema.register("editor.fontSize", Scope::Folder);
/// schema.register("update.channel", Scope::User);
/// assert!(schema.is_valid_in_scope("editor.fontSize", Scope::Folder));
/// assert!(!schema.is_valid_in_scope("update.channel", Scope::Workspace));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    /// Maps preference name to the highest scope it may live in.
    max_scopes: HashMap<String, Scope>,
    /// Top-level sections reserved for workspace/folder configuration.
    workspace_only: HashSet<String>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a preference name with the highest scope it may live in.
    ///
    /// Re-registering a name replaces the previous entry.
    pub fn register(&mut self, name: impl Into<String>, max_scope: Scope) {
        self.max_scopes.insert(name.into(), max_scope);
    }

    /// Reserve a top-level section for workspace/folder configuration.
    pub fn reserve_workspace_only_section(&mut self, section: impl Into<String>) {
        self.workspace_only.insert(section.into());
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.max_scopes.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.max_scopes.is_empty()
    }
}

impl PreferenceSchema for SchemaRegistry {
    fn is_valid_in_scope(&self, name: &str, scope: Scope) -> bool {
        match self.max_scopes.get(name) {
            Some(max_scope) => scope <= *max_scope,
            None => true,
        }
    }

    fn preference_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.max_scopes.keys().cloned().collect();
        names.sort();
        names
    }

    fn is_workspace_only_section(&self, section: &str) -> bool {
        self.workspace_only.contains(section)
    }
}
