//! The provider contract: one backing store per scope.

use std::sync::Arc;

use async_trait::async_trait;
use pref_model::{ChangeBatch, PreferenceValue, Scope, Subscription};

use crate::error::Result;

/// Callback invoked with each change batch a provider emits.
pub type ChangeHandler = Arc<dyn Fn(&ChangeBatch) + Send + Sync>;

/// Raw per-provider resolution: the value and its backing file, no merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResolution {
    /// The raw value at this provider's scope, if any.
    pub value: Option<PreferenceValue>,

    /// URI of the backing file that holds the value, if any.
    pub config_uri: Option<String>,
}

/// A per-scope preference backend.
///
/// One provider exists per [`Scope`]; the folder tier is exposed to the
/// engine as a single provider aggregating all folder roots. The engine
/// holds the provider reference for its lifetime but never owns the
/// provider's internal state.
///
/// Read failures inside a provider must degrade to `None` lookups — a
/// broken backing store contributes nothing at every query instead of
/// aborting the resolution walk.
#[async_trait]
pub trait PreferenceProvider: Send + Sync {
    /// The scope this provider backs.
    fn scope(&self) -> Scope;

    /// Wait until the provider has loaded its backing store.
    ///
    /// Settles at most once per provider lifetime: either successfully,
    /// after which synchronous lookups reflect the store, or with an error
    /// that is permanent for this provider.
    async fn when_ready(&self) -> Result<()>;

    /// Synchronous point lookup.
    ///
    /// With a `language`, only the language-specific table is consulted;
    /// falling back to the plain value is the engine's job, not the
    /// provider's.
    fn get(
        &self,
        name: &str,
        resource: Option<&str>,
        language: Option<&str>,
    ) -> Option<PreferenceValue>;

    /// Point lookup carrying the backing file that contributed the value.
    fn resolve(
        &self,
        name: &str,
        resource: Option<&str>,
        language: Option<&str>,
    ) -> ProviderResolution;

    /// Best-effort write to the backing store.
    ///
    /// `None` deletes the value. Returns `Ok(false)` when the provider
    /// declined the write. Observers learn about the effect through the
    /// change stream, not through this return value.
    async fn write(
        &self,
        name: &str,
        value: Option<PreferenceValue>,
        resource: Option<&str>,
        language: Option<&str>,
    ) -> Result<bool>;

    /// Register a change listener. Batches are delivered synchronously,
    /// coalesced at the provider boundary.
    fn subscribe(&self, handler: ChangeHandler) -> Subscription;
}
