//! Resolution outcomes with provenance.

use serde::de::DeserializeOwned;

use crate::scope::Scope;
use crate::value::PreferenceValue;

/// Untyped outcome of a resolution walk.
///
/// `scope` records the last scope whose contribution changed the merged
/// value, which for record values is not necessarily the highest scope
/// queried. This is what the engine memoizes; typed views are projected
/// from it at the service boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPreference {
    /// The merged value, or `None` when no scope contributed.
    pub value: Option<PreferenceValue>,

    /// Origin of the final value. Defaults to [`Scope::Default`].
    pub scope: Scope,

    /// Backing file URI that contributed the value, if any.
    pub config_uri: Option<String>,

    /// True iff a language overlay value contributed to the result.
    pub language_specific: bool,
}

impl ResolvedPreference {
    /// Project this resolution into a typed result.
    ///
    /// A value that does not deserialize into `T` degrades to `None`;
    /// resolution never fails for a well-formed name.
    pub fn into_typed<T: DeserializeOwned>(self) -> ResolveResult<T> {
        ResolveResult {
            value: self
                .value
                .and_then(|value| serde_json::from_value(value).ok()),
            scope: self.scope,
            config_uri: self.config_uri,
            language_specific: self.language_specific,
        }
    }
}

/// Typed resolution result handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveResult<T> {
    /// The resolved value, or `None` when nothing contributed and no
    /// default was supplied.
    pub value: Option<T>,

    /// Origin of the final value.
    pub scope: Scope,

    /// Backing file URI that contributed the value, if any.
    pub config_uri: Option<String>,

    /// True iff the value required a language overlay.
    pub language_specific: bool,
}

/// Per-scope raw values for one preference, without merging.
///
/// This is the diagnostic counterpart of `resolve`: consumer UIs use it to
/// show which scope overrides which.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceInspection<T> {
    /// The inspected preference name.
    pub name: String,

    /// Raw value at [`Scope::Default`], if any.
    pub default_value: Option<T>,

    /// Raw value at [`Scope::User`], if any.
    pub user_value: Option<T>,

    /// Raw value at [`Scope::Workspace`], if any.
    pub workspace_value: Option<T>,

    /// Raw value at [`Scope::Folder`], if any.
    pub folder_value: Option<T>,
}
