//! The consumer-facing preference service.
//!
//! One service exists per logical workspace session. It owns the cache and
//! the event channels, holds one provider reference per scope, and turns
//! provider change batches into reconciled consumer events. Queries are
//! synchronous once the service is ready; writes are asynchronous and
//! observed through the change stream.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use futures::future::try_join_all;
use pref_model::{
    ChangeBatch, Emitter, PreferenceChange, PreferenceInspection, PreferenceSchema,
    PreferenceValue, ResolveResult, ResolvedPreference, Scope, Subscription, value_at_path,
};
use pref_provider::PreferenceProvider;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::cache::{CacheKey, PreferenceCache};
use crate::error::{Error, Result};
use crate::reconciler::{ReconciledChanges, reconcile};
use crate::resolver::{ScopedProviders, overlay_language, resolve_raw};
use crate::write;

/// One language's effective changes, delivered per reconciliation pass.
#[derive(Debug, Clone)]
pub struct LanguagePreferenceChanges {
    pub language: String,
    pub changes: HashMap<String, PreferenceChange>,
}

/// One origin scope's effective changes, for consumers that distinguish
/// default/user/workspace/folder provenance.
#[derive(Debug, Clone)]
pub struct ScopePreferenceChanges {
    pub scope: Scope,
    pub changes: HashMap<String, PreferenceChange>,
}

struct ServiceInner {
    providers: ScopedProviders,
    schema: Arc<dyn PreferenceSchema>,
    cache: Mutex<PreferenceCache>,
    preference_changed: Emitter<PreferenceChange>,
    preferences_changed: Emitter<HashMap<String, PreferenceChange>>,
    language_preferences_changed: Emitter<LanguagePreferenceChanges>,
    scope_changed: Emitter<ScopePreferenceChanges>,
    disposed: watch::Sender<bool>,
    provider_subscriptions: Mutex<Vec<Subscription>>,
}

impl ServiceInner {
    /// Cache-backed resolve for one exact query context.
    ///
    /// A language query builds on the (cached or freshly computed)
    /// language-agnostic result for the same context and applies only the
    /// overlay pass on top.
    fn resolve_cached(
        &self,
        name: &str,
        resource: Option<&str>,
        language: Option<&str>,
        ceiling: Option<Scope>,
    ) -> ResolvedPreference {
        if name.trim().is_empty() {
            return ResolvedPreference::default();
        }
        let key = CacheKey::new(language, ceiling, resource);
        {
            let mut cache = self.cache.lock().unwrap();
            if let Some(hit) = cache.get(name, &key) {
                tracing::trace!(name, "cache hit");
                return hit;
            }
        }
        let result = match language {
            None => resolve_raw(
                &self.providers,
                self.schema.as_ref(),
                name,
                resource,
                None,
                ceiling,
            ),
            Some(language) => {
                let base = self.resolve_cached(name, resource, None, ceiling);
                overlay_language(
                    &self.providers,
                    self.schema.as_ref(),
                    name,
                    resource,
                    language,
                    ceiling,
                    base,
                )
            }
        };
        self.cache
            .lock()
            .unwrap()
            .insert(name, key, result.clone());
        result
    }

    /// Resolve with the dotted-path fallback applied.
    fn resolve_effective(
        &self,
        name: &str,
        resource: Option<&str>,
        language: Option<&str>,
    ) -> ResolvedPreference {
        let direct = self.resolve_cached(name, resource, language, None);
        if direct.value.is_some() {
            return direct;
        }
        self.resolve_dotted(name, resource, language).unwrap_or(direct)
    }

    /// Recover a value set on a container record rather than on the fully
    /// qualified leaf name: walk prefixes of `name` from longest to
    /// shortest, and index the remaining segments into the first prefix
    /// that resolves. The first defined prefix decides; a failed key
    /// access yields nothing.
    fn resolve_dotted(
        &self,
        name: &str,
        resource: Option<&str>,
        language: Option<&str>,
    ) -> Option<ResolvedPreference> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() < 2 {
            return None;
        }
        for split in (1..segments.len()).rev() {
            let prefix = segments[..split].join(".");
            let container = self.resolve_cached(&prefix, resource, language, None);
            let Some(value) = container.value.as_ref() else {
                continue;
            };
            let extracted = value_at_path(value, &segments[split..])?.clone();
            tracing::trace!(name, container = %prefix, "dotted-path fallback hit");
            return Some(ResolvedPreference {
                value: Some(extracted),
                scope: container.scope,
                config_uri: container.config_uri.clone(),
                language_specific: container.language_specific,
            });
        }
        None
    }

    /// One reconciliation pass for one provider batch. Invalidation runs
    /// to completion before any event fires, so a listener re-reading a
    /// changed name never observes a stale cache.
    fn on_provider_batch(&self, batch: &ChangeBatch) {
        if *self.disposed.borrow() {
            return;
        }
        let reconciled = reconcile(batch, &self.providers, self.schema.as_ref());
        {
            let mut cache = self.cache.lock().unwrap();
            for name in &reconciled.invalidated {
                if cache.invalidate(name) {
                    tracing::debug!(name, "cache invalidated");
                }
            }
        }
        if reconciled.is_empty() {
            return;
        }
        self.emit_reconciled(reconciled);
    }

    fn emit_reconciled(&self, reconciled: ReconciledChanges) {
        let ReconciledChanges {
            changes,
            by_language,
            ..
        } = reconciled;

        if !changes.is_empty() {
            self.preferences_changed.emit(&changes);
            for change in changes.values() {
                self.preference_changed.emit(change);
            }

            let mut by_scope: HashMap<Scope, HashMap<String, PreferenceChange>> = HashMap::new();
            for (name, change) in &changes {
                by_scope
                    .entry(change.scope)
                    .or_default()
                    .insert(name.clone(), change.clone());
            }
            for scope in Scope::ascending() {
                if let Some(scope_changes) = by_scope.remove(&scope) {
                    self.scope_changed.emit(&ScopePreferenceChanges {
                        scope,
                        changes: scope_changes,
                    });
                }
            }
        }

        for (language, changes) in by_language {
            self.language_preferences_changed
                .emit(&LanguagePreferenceChanges { language, changes });
        }
    }
}

/// Resolves preferences across scopes and exposes reconciled change
/// events.
///
/// Cloning is shallow; every clone shares the same cache, providers, and
/// listeners.
pub struct PreferenceService {
    inner: Arc<ServiceInner>,
}

impl Clone for PreferenceService {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl PreferenceService {
    /// Build a service from a schema and a provider factory.
    ///
    /// The factory is called once per scope; a `None` means that scope has
    /// no backing store and contributes nothing. The service subscribes to
    /// every provider's change stream immediately.
    pub fn new(
        schema: Arc<dyn PreferenceSchema>,
        factory: impl Fn(Scope) -> Option<Arc<dyn PreferenceProvider>>,
    ) -> Self {
        let (disposed, _) = watch::channel(false);
        let inner = Arc::new(ServiceInner {
            providers: ScopedProviders::from_factory(factory),
            schema,
            cache: Mutex::new(PreferenceCache::new()),
            preference_changed: Emitter::new(),
            preferences_changed: Emitter::new(),
            language_preferences_changed: Emitter::new(),
            scope_changed: Emitter::new(),
            disposed,
            provider_subscriptions: Mutex::new(Vec::new()),
        });

        let mut subscriptions = Vec::new();
        for (_, provider) in inner.providers.iter() {
            let weak: Weak<ServiceInner> = Arc::downgrade(&inner);
            subscriptions.push(provider.subscribe(Arc::new(move |batch: &ChangeBatch| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_provider_batch(batch);
                }
            })));
        }
        *inner.provider_subscriptions.lock().unwrap() = subscriptions;

        Self { inner }
    }

    /// Wait until every provider is ready.
    ///
    /// All providers are awaited concurrently and any failure fails the
    /// whole service's readiness. Disposal rejects pending waiters.
    pub async fn when_ready(&self) -> Result<()> {
        let mut disposed = self.inner.disposed.subscribe();
        if *disposed.borrow() {
            return Err(Error::Disposed);
        }
        let pending = try_join_all(
            self.inner
                .providers
                .iter()
                .map(|(_, provider)| provider.when_ready()),
        );
        tokio::select! {
            ready = pending => {
                ready?;
                Ok(())
            }
            _ = disposed.wait_for(|disposed| *disposed) => Err(Error::Disposed),
        }
    }

    /// Whether [`PreferenceService::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        *self.inner.disposed.borrow()
    }

    /// Resolved value for `name`, or `None` when nothing contributes.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.resolve(name, None, None).value
    }

    /// Resolved value for `name`, substituting `default` when nothing
    /// contributes. The default is applied per call and never cached.
    pub fn get_with_default<T: DeserializeOwned>(&self, name: &str, default: T) -> T {
        self.get(name).unwrap_or(default)
    }

    /// Whether any scope contributes a value for `name`.
    pub fn has(&self, name: &str) -> bool {
        self.inner.resolve_effective(name, None, None).value.is_some()
    }

    /// Merged, scope-attributed resolution for `name` in an optional
    /// resource and language context.
    pub fn resolve<T: DeserializeOwned>(
        &self,
        name: &str,
        resource: Option<&str>,
        language: Option<&str>,
    ) -> ResolveResult<T> {
        self.inner
            .resolve_effective(name, resource, language)
            .into_typed()
    }

    /// [`PreferenceService::resolve`] with a caller default applied at the
    /// read boundary.
    pub fn resolve_with_default<T: DeserializeOwned>(
        &self,
        name: &str,
        default: T,
        resource: Option<&str>,
        language: Option<&str>,
    ) -> ResolveResult<T> {
        let mut result = self.resolve(name, resource, language);
        if result.value.is_none() {
            result.value = Some(default);
        }
        result
    }

    /// Per-scope raw values for `name`, without merging.
    pub fn inspect<T: DeserializeOwned>(
        &self,
        name: &str,
        resource: Option<&str>,
    ) -> PreferenceInspection<T> {
        let value_at = |scope: Scope| -> Option<T> {
            if !self.inner.schema.is_valid_in_scope(name, scope) {
                return None;
            }
            let value = self.inner.providers.value_at(scope, name, resource, None)?;
            serde_json::from_value(value).ok()
        };
        PreferenceInspection {
            name: name.to_string(),
            default_value: value_at(Scope::Default),
            user_value: value_at(Scope::User),
            workspace_value: value_at(Scope::Workspace),
            folder_value: value_at(Scope::Folder),
        }
    }

    /// Snapshot of every schema-known preference that resolves to a value
    /// in the given resource context.
    pub fn preferences(&self, resource: Option<&str>) -> HashMap<String, PreferenceValue> {
        let mut all = HashMap::new();
        for name in self.inner.schema.preference_names() {
            if let Some(value) = self.inner.resolve_effective(&name, resource, None).value {
                all.insert(name, value);
            }
        }
        all
    }

    /// Route a write to the correct scope's provider.
    ///
    /// `None` deletes the value. The returned future settles when the
    /// provider accepted the write; the effect becomes observable through
    /// the change events, not through this completion.
    pub async fn set(
        &self,
        name: &str,
        value: Option<PreferenceValue>,
        scope: Option<Scope>,
        resource: Option<&str>,
    ) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::Disposed);
        }
        let target = write::target_scope(scope, resource);
        write::validate_write(self.inner.schema.as_ref(), name, target, resource)?;
        let provider = self
            .inner
            .providers
            .get(target)
            .ok_or(Error::NoProviderForScope { scope: target })?;
        let written = provider.write(name, value, resource, None).await?;
        if !written {
            return Err(Error::WriteRejected {
                name: name.to_string(),
                scope: target,
            });
        }
        tracing::debug!(name, scope = %target, "preference written");
        Ok(())
    }

    /// One event per effective language-agnostic change.
    pub fn on_preference_changed(
        &self,
        listener: impl Fn(&PreferenceChange) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.preference_changed.subscribe(listener)
    }

    /// One batched event per reconciliation pass.
    pub fn on_preferences_changed(
        &self,
        listener: impl Fn(&HashMap<String, PreferenceChange>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.preferences_changed.subscribe(listener)
    }

    /// One event per language with that language's effective changes.
    pub fn on_language_preferences_changed(
        &self,
        listener: impl Fn(&LanguagePreferenceChanges) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.language_preferences_changed.subscribe(listener)
    }

    /// One event per origin scope present in a reconciliation pass.
    pub fn on_scope_changed(
        &self,
        listener: impl Fn(&ScopePreferenceChanges) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.scope_changed.subscribe(listener)
    }

    /// Tear the service down: detach from all providers, reject pending
    /// readiness waiters, drop the cache. Idempotent.
    pub fn dispose(&self) {
        let first = self.inner.disposed.send_if_modified(|disposed| {
            if *disposed {
                false
            } else {
                *disposed = true;
                true
            }
        });
        if !first {
            return;
        }
        self.inner.provider_subscriptions.lock().unwrap().clear();
        self.inner.cache.lock().unwrap().clear();
        tracing::debug!("preference service disposed");
    }
}
