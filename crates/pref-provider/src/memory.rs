//! In-memory preference provider.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pref_model::{ChangeBatch, Emitter, PreferenceChange, PreferenceValue, Scope, Subscription};
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::provider::{ChangeHandler, PreferenceProvider, ProviderResolution};

#[derive(Debug, Clone, PartialEq)]
enum ReadyState {
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug, Default)]
struct Tables {
    values: HashMap<String, PreferenceValue>,
    /// language → name → value
    language_values: HashMap<String, HashMap<String, PreferenceValue>>,
}

/// A provider backed by plain in-memory tables.
///
/// Serves as a lightweight backend for embedders without file storage and
/// as the workhorse provider of the test suites: mutations emit the same
/// coalesced [`ChangeBatch`] a file-backed provider would, and readiness
/// can be gated to exercise the engine's startup paths.
pub struct MemoryPreferenceProvider {
    scope: Scope,
    config_uri: Option<String>,
    tables: RwLock<Tables>,
    changes: Emitter<ChangeBatch>,
    ready: watch::Sender<ReadyState>,
    read_only: AtomicBool,
}

impl MemoryPreferenceProvider {
    /// Create a provider that is ready immediately.
    pub fn new(scope: Scope) -> Self {
        Self::build(scope, None, ReadyState::Ready)
    }

    /// Create a ready provider reporting `config_uri` as its backing file.
    pub fn with_config_uri(scope: Scope, config_uri: impl Into<String>) -> Self {
        Self::build(scope, Some(config_uri.into()), ReadyState::Ready)
    }

    /// Create a provider whose readiness is gated on [`Self::mark_ready`]
    /// or [`Self::fail_ready`].
    pub fn pending(scope: Scope) -> Self {
        Self::build(scope, None, ReadyState::Pending)
    }

    fn build(scope: Scope, config_uri: Option<String>, state: ReadyState) -> Self {
        let (ready, _) = watch::channel(state);
        Self {
            scope,
            config_uri,
            tables: RwLock::new(Tables::default()),
            changes: Emitter::new(),
            ready,
            read_only: AtomicBool::new(false),
        }
    }

    /// Fulfil a pending readiness gate. No-op once settled.
    pub fn mark_ready(&self) {
        self.settle(ReadyState::Ready);
    }

    /// Fail a pending readiness gate permanently. No-op once settled.
    pub fn fail_ready(&self, reason: impl Into<String>) {
        self.settle(ReadyState::Failed(reason.into()));
    }

    fn settle(&self, target: ReadyState) {
        self.ready.send_if_modified(|state| {
            if *state == ReadyState::Pending {
                *state = target;
                true
            } else {
                false
            }
        });
    }

    /// Make subsequent writes return `Ok(false)`.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Store or delete a language-agnostic value and emit the change.
    ///
    /// A no-op store (same value) emits nothing; coalescing idempotent
    /// writes is part of the provider contract.
    pub fn set_value(&self, name: &str, value: Option<PreferenceValue>, domain: Vec<String>) {
        let old_value = {
            let mut tables = self.tables.write().unwrap();
            match &value {
                Some(new_value) => tables.values.insert(name.to_string(), new_value.clone()),
                None => tables.values.remove(name),
            }
        };
        if old_value == value {
            return;
        }
        let mut batch = ChangeBatch::default();
        batch.changes.insert(
            name.to_string(),
            PreferenceChange {
                name: name.to_string(),
                old_value,
                new_value: value,
                scope: self.scope,
                domain,
            },
        );
        tracing::trace!(name, scope = %self.scope, "memory provider change");
        self.changes.emit(&batch);
    }

    /// Store or delete a language-specific value and emit the change.
    pub fn set_language_value(
        &self,
        language: &str,
        name: &str,
        value: Option<PreferenceValue>,
        domain: Vec<String>,
    ) {
        let old_value = {
            let mut tables = self.tables.write().unwrap();
            let table = tables.language_values.entry(language.to_string()).or_default();
            match &value {
                Some(new_value) => table.insert(name.to_string(), new_value.clone()),
                None => table.remove(name),
            }
        };
        if old_value == value {
            return;
        }
        let mut batch = ChangeBatch::default();
        batch.language_specific.entry(language.to_string()).or_default().insert(
            name.to_string(),
            PreferenceChange {
                name: name.to_string(),
                old_value,
                new_value: value,
                scope: self.scope,
                domain,
            },
        );
        tracing::trace!(name, language, scope = %self.scope, "memory provider language change");
        self.changes.emit(&batch);
    }
}

#[async_trait]
impl PreferenceProvider for MemoryPreferenceProvider {
    fn scope(&self) -> Scope {
        self.scope
    }

    async fn when_ready(&self) -> Result<()> {
        let mut ready = self.ready.subscribe();
        let state = ready
            .wait_for(|state| *state != ReadyState::Pending)
            .await
            .map_err(|_| Error::NotReady {
                scope: self.scope,
                reason: "provider dropped before becoming ready".to_string(),
            })?
            .clone();
        match state {
            ReadyState::Failed(reason) => Err(Error::NotReady {
                scope: self.scope,
                reason,
            }),
            _ => Ok(()),
        }
    }

    fn get(
        &self,
        name: &str,
        _resource: Option<&str>,
        language: Option<&str>,
    ) -> Option<PreferenceValue> {
        let tables = self.tables.read().unwrap();
        match language {
            Some(language) => tables.language_values.get(language)?.get(name).cloned(),
            None => tables.values.get(name).cloned(),
        }
    }

    fn resolve(
        &self,
        name: &str,
        resource: Option<&str>,
        language: Option<&str>,
    ) -> ProviderResolution {
        let value = self.get(name, resource, language);
        let config_uri = if value.is_some() {
            self.config_uri.clone()
        } else {
            None
        };
        ProviderResolution { value, config_uri }
    }

    async fn write(
        &self,
        name: &str,
        value: Option<PreferenceValue>,
        _resource: Option<&str>,
        language: Option<&str>,
    ) -> Result<bool> {
        if self.read_only.load(Ordering::SeqCst) {
            return Ok(false);
        }
        match language {
            Some(language) => self.set_language_value(language, name, value, vec![]),
            None => self.set_value(name, value, vec![]),
        }
        Ok(true)
    }

    fn subscribe(&self, handler: ChangeHandler) -> Subscription {
        self.changes.subscribe(move |batch| handler(batch))
    }
}
