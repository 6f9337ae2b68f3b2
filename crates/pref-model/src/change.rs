//! Change notifications flowing from providers to the engine and on to
//! consumers.

use std::collections::HashMap;

use crate::scope::Scope;
use crate::value::PreferenceValue;

/// A single preference change.
///
/// Providers report changes with their own scope; during reconciliation the
/// engine may reattribute `scope` and `new_value` to the scope that is
/// effectively visible after the change. `scope` is therefore a computed
/// field, not an immutable provider fact.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceChange {
    /// The affected preference name.
    pub name: String,

    /// Value before the change, if any.
    pub old_value: Option<PreferenceValue>,

    /// Value after the change; `None` is a deletion.
    pub new_value: Option<PreferenceValue>,

    /// Scope of origin, possibly reattributed during reconciliation.
    pub scope: Scope,

    /// Resource URIs this change applies to. Empty means global.
    pub domain: Vec<String>,
}

impl PreferenceChange {
    /// Whether this change is visible for the given resource.
    ///
    /// A change with an empty domain applies everywhere. Otherwise the
    /// resource must equal a domain entry or live underneath one.
    pub fn affects(&self, resource: Option<&str>) -> bool {
        let Some(resource) = resource else {
            return true;
        };
        if self.domain.is_empty() {
            return true;
        }
        self.domain
            .iter()
            .any(|root| resource == root || resource.strip_prefix(root.as_str()).is_some_and(|rest| rest.starts_with('/')))
    }

    /// Whether this change removes the value at its scope.
    pub fn is_deletion(&self) -> bool {
        self.new_value.is_none()
    }
}

/// One coalesced notification unit from a provider.
///
/// `changes` holds language-agnostic changes by preference name;
/// `language_specific` holds per-language change maps. Providers coalesce
/// at this boundary, so a batch is processed as one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeBatch {
    /// Language-agnostic changes by preference name.
    pub changes: HashMap<String, PreferenceChange>,

    /// Language-specific changes: language → name → change.
    pub language_specific: HashMap<String, HashMap<String, PreferenceChange>>,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.language_specific.is_empty()
    }
}
