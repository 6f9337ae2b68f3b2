//! Scope resolution, caching, and change reconciliation engine for
//! Preference Manager.
//!
//! This crate implements the core of the settings subsystem:
//!
//! - **Resolution**: walk scopes in precedence order, fold contributions
//!   with the overlay merge rule, apply the language overlay, and fall
//!   back to dotted-path lookup for values set on container records
//! - **Cache**: bounded two-level memoization of resolution results with
//!   whole-name invalidation
//! - **Reconciliation**: re-attribute raw provider changes to their
//!   effective visible scope, deduplicate, and emit typed consumer events
//! - **Write routing**: validate and dispatch set requests to the correct
//!   scope's provider
//!
//! # Architecture
//!
//! `pref-engine` sits above the layer 0 crates and below the embedding
//! platform:
//!
//! ```text
//!        platform features (editors, UIs, ...)
//!                       |
//!               PreferenceService
//!                       |
//!          +------------+------------+
//!          |                         |
//!      pref-model              pref-provider
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pref_engine::PreferenceService;
//! use pref_model::{SchemaRegistry, Scope};
//! use pref_provider::{MemoryPreferenceProvider, PreferenceProvider};
//! use serde_json::json;
//!
//! let user = Arc::new(MemoryPreferenceProvider::new(Scope::User));
//! user.set_value("editor.fontSize", Some(json!(14)), vec![]);
//!
//! let service = PreferenceService::new(Arc::new(SchemaRegistry::new()), |scope| {
//!     Some(match scope {
//!         Scope::User => user.clone() as Arc<dyn PreferenceProvider>,
//!         _ => Arc::new(MemoryPreferenceProvider::new(scope)) as Arc<dyn PreferenceProvider>,
//!     })
//! });
//! assert_eq!(service.get::<u32>("editor.fontSize"), Some(14));
//! ```

mod cache;
mod reconciler;
mod resolver;
mod write;

pub mod error;
pub mod service;

pub use error::{Error, Result};
pub use service::{LanguagePreferenceChanges, PreferenceService, ScopePreferenceChanges};
