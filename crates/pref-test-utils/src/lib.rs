//! Shared test utilities for the preference-manager workspace.
//!
//! This crate provides a standardised service fixture to eliminate
//! duplication across crate test suites. It is a dev-dependency only —
//! never published.

use std::sync::Arc;

use pref_engine::PreferenceService;
use pref_model::{Scope, SchemaRegistry};
use pref_provider::{MemoryPreferenceProvider, PreferenceProvider};
use serde_json::Value;

/// A fully wired preference service over memory providers, one per scope.
///
/// The provider handles stay accessible so tests can mutate backing state
/// and drive change batches after the service is built.
pub struct ServiceHarness {
    pub service: PreferenceService,
    providers: [Arc<MemoryPreferenceProvider>; Scope::COUNT],
}

impl ServiceHarness {
    pub fn builder() -> ServiceHarnessBuilder {
        ServiceHarnessBuilder::default()
    }

    /// The memory provider backing `scope`.
    pub fn provider(&self, scope: Scope) -> &MemoryPreferenceProvider {
        &self.providers[scope.index()]
    }
}

/// Builder for [`ServiceHarness`].
#[derive(Default)]
pub struct ServiceHarnessBuilder {
    schema: SchemaRegistry,
    seeds: Vec<(Scope, String, Value)>,
    language_seeds: Vec<(Scope, String, String, Value)>,
    pending: Vec<Scope>,
}

impl ServiceHarnessBuilder {
    /// Register a schema entry: `name` is valid at `max_scope` and below.
    pub fn register(mut self, name: &str, max_scope: Scope) -> Self {
        self.schema.register(name, max_scope);
        self
    }

    /// Reserve a top-level section for workspace/folder configuration.
    pub fn workspace_only_section(mut self, section: &str) -> Self {
        self.schema.reserve_workspace_only_section(section);
        self
    }

    /// Seed a language-agnostic value before the service is built, so no
    /// change events fire for it.
    pub fn value(mut self, scope: Scope, name: &str, value: Value) -> Self {
        self.seeds.push((scope, name.to_string(), value));
        self
    }

    /// Seed a language-specific value before the service is built.
    pub fn language_value(mut self, scope: Scope, language: &str, name: &str, value: Value) -> Self {
        self.language_seeds
            .push((scope, language.to_string(), name.to_string(), value));
        self
    }

    /// Gate the readiness of `scope`'s provider on an explicit
    /// `mark_ready`/`fail_ready` call.
    pub fn pending(mut self, scope: Scope) -> Self {
        self.pending.push(scope);
        self
    }

    pub fn build(self) -> ServiceHarness {
        let providers: [Arc<MemoryPreferenceProvider>; Scope::COUNT] =
            [Scope::Default, Scope::User, Scope::Workspace, Scope::Folder].map(|scope| {
                if self.pending.contains(&scope) {
                    Arc::new(MemoryPreferenceProvider::pending(scope))
                } else {
                    Arc::new(MemoryPreferenceProvider::new(scope))
                }
            });

        for (scope, name, value) in self.seeds {
            providers[scope.index()].set_value(&name, Some(value), vec![]);
        }
        for (scope, language, name, value) in self.language_seeds {
            providers[scope.index()].set_language_value(&language, &name, Some(value), vec![]);
        }

        let service = PreferenceService::new(Arc::new(self.schema), |scope| {
            Some(providers[scope.index()].clone() as Arc<dyn PreferenceProvider>)
        });
        ServiceHarness { service, providers }
    }
}
