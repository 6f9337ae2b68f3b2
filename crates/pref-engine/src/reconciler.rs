//! Turns raw provider change batches into effective, scope-attributed
//! consumer changes.
//!
//! A provider reports a change at its own scope, but the value a consumer
//! sees may come from elsewhere: a more specific scope can shadow the
//! change entirely, and a deletion can make the effective value fall
//! through to another scope. Each raw change is therefore re-attributed
//! to the scope that is actually visible after the change, deduplicated
//! by name, and only then emitted.

use std::collections::HashMap;

use pref_model::{ChangeBatch, PreferenceChange, PreferenceSchema, Scope};

use crate::resolver::{ScopedProviders, resolve_raw};

/// Outcome of reconciling one raw change.
enum EffectiveChange {
    /// Emit on the channel the change arrived on.
    Scoped(PreferenceChange),
    /// A language-specific clearing with no fallback left; emit on the
    /// language-agnostic channel instead.
    Demoted(PreferenceChange),
}

/// The effective changes of one reconciliation pass.
#[derive(Debug, Default)]
pub(crate) struct ReconciledChanges {
    /// Language-agnostic effective changes by preference name.
    pub changes: HashMap<String, PreferenceChange>,

    /// Language-specific effective changes: language → name → change.
    pub by_language: HashMap<String, HashMap<String, PreferenceChange>>,

    /// Every name that appeared in the raw batch, accepted or not.
    ///
    /// Shadowed record changes can still alter a merged value, so cache
    /// invalidation covers the whole batch rather than only the accepted
    /// changes.
    pub invalidated: Vec<String>,
}

impl ReconciledChanges {
    pub(crate) fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.by_language.is_empty()
    }
}

/// Reconcile one provider batch against the current provider state.
pub(crate) fn reconcile(
    batch: &ChangeBatch,
    providers: &ScopedProviders,
    schema: &dyn PreferenceSchema,
) -> ReconciledChanges {
    let mut out = ReconciledChanges::default();

    for (name, change) in &batch.changes {
        out.invalidated.push(name.clone());
        if let Some(EffectiveChange::Scoped(effective) | EffectiveChange::Demoted(effective)) =
            reconcile_change(change, None, providers, schema)
        {
            out.changes.insert(name.clone(), effective);
        }
    }

    for (language, changes) in &batch.language_specific {
        for (name, change) in changes {
            out.invalidated.push(name.clone());
            match reconcile_change(change, Some(language), providers, schema) {
                Some(EffectiveChange::Scoped(effective)) => {
                    out.by_language
                        .entry(language.clone())
                        .or_default()
                        .insert(name.clone(), effective);
                }
                Some(EffectiveChange::Demoted(effective)) => {
                    out.changes.insert(name.clone(), effective);
                }
                None => {}
            }
        }
    }

    out.invalidated.sort();
    out.invalidated.dedup();
    out
}

/// Re-attribute one raw change to its effective visible scope.
///
/// Walks scopes descending. A change to a Folder-eligible name is already
/// as specific as possible and passes through untouched. Otherwise:
///
/// - a defined value at a scope above the reported one either shadows a
///   plain edit (drop) or, for a deletion, becomes the re-announced
///   effective value;
/// - a non-deletion at its own scope is accepted as-is;
/// - a deletion falls through to the first lower scope that still defines
///   a value;
/// - a deletion reaching Default with nothing defined in the probed
///   context demotes to a language-agnostic change carrying the full
///   plain resolution of the name.
fn reconcile_change(
    change: &PreferenceChange,
    language: Option<&str>,
    providers: &ScopedProviders,
    schema: &dyn PreferenceSchema,
) -> Option<EffectiveChange> {
    if schema.is_valid_in_scope(&change.name, Scope::Folder) {
        return Some(EffectiveChange::Scoped(change.clone()));
    }

    let resource = change.domain.first().map(String::as_str);

    for scope in Scope::descending() {
        if !schema.is_valid_in_scope(&change.name, scope) {
            continue;
        }
        if scope > change.scope {
            if let Some(value) = providers.value_at(scope, &change.name, resource, language) {
                if change.is_deletion() {
                    return Some(EffectiveChange::Scoped(reattributed(change, scope, value)));
                }
                tracing::trace!(name = %change.name, shadowing_scope = %scope, "change shadowed");
                return None;
            }
        } else if scope == change.scope {
            if !change.is_deletion() {
                return Some(EffectiveChange::Scoped(change.clone()));
            }
            if scope == Scope::Default {
                return Some(demote(change, resource, providers, schema));
            }
        } else if change.is_deletion() {
            if let Some(value) = providers.value_at(scope, &change.name, resource, language) {
                return Some(EffectiveChange::Scoped(reattributed(change, scope, value)));
            }
            if scope == Scope::Default {
                return Some(demote(change, resource, providers, schema));
            }
        }
    }

    None
}

fn reattributed(
    change: &PreferenceChange,
    scope: Scope,
    value: pref_model::PreferenceValue,
) -> PreferenceChange {
    let mut effective = change.clone();
    effective.scope = scope;
    effective.new_value = Some(value);
    effective
}

/// A deletion with no fallback left in its own context: recompute the
/// plain resolution of the name and emit that as a language-agnostic
/// change.
fn demote(
    change: &PreferenceChange,
    resource: Option<&str>,
    providers: &ScopedProviders,
    schema: &dyn PreferenceSchema,
) -> EffectiveChange {
    let resolved = resolve_raw(providers, schema, &change.name, resource, None, None);
    let mut effective = change.clone();
    effective.scope = resolved.scope;
    effective.new_value = resolved.value;
    EffectiveChange::Demoted(effective)
}
