//! The per-query resolution walk.
//!
//! Resolution iterates scopes in ascending precedence order, folds every
//! defined contribution with the overlay merge rule, and attributes the
//! result to the last scope whose contribution changed the value. The
//! language overlay repeats the walk with language-specific lookups on
//! top of the language-agnostic result.

use std::sync::Arc;

use pref_model::{PreferenceSchema, ResolvedPreference, Scope, overlay_value};
use pref_provider::PreferenceProvider;

/// The engine's scope-indexed provider table.
///
/// Filled once at construction from a factory; a scope without a provider
/// contributes nothing to resolution and rejects writes.
pub(crate) struct ScopedProviders {
    providers: [Option<Arc<dyn PreferenceProvider>>; Scope::COUNT],
}

impl ScopedProviders {
    pub(crate) fn from_factory(
        factory: impl Fn(Scope) -> Option<Arc<dyn PreferenceProvider>>,
    ) -> Self {
        let mut providers: [Option<Arc<dyn PreferenceProvider>>; Scope::COUNT] =
            [None, None, None, None];
        for scope in Scope::ascending() {
            providers[scope.index()] = factory(scope);
        }
        Self { providers }
    }

    pub(crate) fn get(&self, scope: Scope) -> Option<&Arc<dyn PreferenceProvider>> {
        self.providers[scope.index()].as_ref()
    }

    /// Present providers in ascending scope order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Scope, &Arc<dyn PreferenceProvider>)> {
        Scope::ascending()
            .filter_map(|scope| self.get(scope).map(|provider| (scope, provider)))
    }

    /// Raw point lookup at one scope; `None` when the scope has no
    /// provider.
    pub(crate) fn value_at(
        &self,
        scope: Scope,
        name: &str,
        resource: Option<&str>,
        language: Option<&str>,
    ) -> Option<pref_model::PreferenceValue> {
        self.get(scope)?.get(name, resource, language)
    }
}

/// Resolve `name` across all scopes, bypassing the cache.
///
/// `ceiling` caps the walk at a scope (inclusive); `None` walks every
/// scope. The schema is consulted per scope and ineligible scopes are
/// skipped entirely.
pub(crate) fn resolve_raw(
    providers: &ScopedProviders,
    schema: &dyn PreferenceSchema,
    name: &str,
    resource: Option<&str>,
    language: Option<&str>,
    ceiling: Option<Scope>,
) -> ResolvedPreference {
    let mut result = ResolvedPreference::default();
    walk(providers, schema, name, resource, None, ceiling, &mut result);
    if let Some(language) = language {
        result = overlay_language(providers, schema, name, resource, language, ceiling, result);
    }

    tracing::trace!(
        name,
        scope = %result.scope,
        defined = result.value.is_some(),
        language_specific = result.language_specific,
        "resolved"
    );
    result
}

/// Run the language overlay pass on top of an already computed
/// language-agnostic result. The base may come straight out of the cache.
pub(crate) fn overlay_language(
    providers: &ScopedProviders,
    schema: &dyn PreferenceSchema,
    name: &str,
    resource: Option<&str>,
    language: &str,
    ceiling: Option<Scope>,
    mut base: ResolvedPreference,
) -> ResolvedPreference {
    walk(providers, schema, name, resource, Some(language), ceiling, &mut base);
    base
}

fn walk(
    providers: &ScopedProviders,
    schema: &dyn PreferenceSchema,
    name: &str,
    resource: Option<&str>,
    language: Option<&str>,
    ceiling: Option<Scope>,
    result: &mut ResolvedPreference,
) {
    for (scope, provider) in providers.iter() {
        if ceiling.is_some_and(|ceiling| scope > ceiling) {
            break;
        }
        if !schema.is_valid_in_scope(name, scope) {
            continue;
        }
        let raw = provider.resolve(name, resource, language);
        if let Some(value) = raw.value {
            fold(result, scope, raw.config_uri, value, language.is_some());
        }
    }
}

/// Fold one scope's contribution into the running result.
///
/// Provenance follows value identity: `scope` and `config_uri` move to
/// the contributing scope only when the merge actually changed the value.
fn fold(
    result: &mut ResolvedPreference,
    scope: Scope,
    config_uri: Option<String>,
    value: pref_model::PreferenceValue,
    from_language_overlay: bool,
) {
    if from_language_overlay {
        result.language_specific = true;
    }
    let merged = overlay_value(result.value.as_ref(), &value);
    if result.value.as_ref() != Some(&merged) {
        result.scope = scope;
        result.config_uri = config_uri;
        result.value = Some(merged);
    }
}
