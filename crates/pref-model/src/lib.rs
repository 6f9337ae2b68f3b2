//! Scope, value, and change model for Preference Manager.
//!
//! This is the layer 0 crate of the workspace: plain data types and pure
//! functions with no async and no I/O. It defines:
//!
//! - **Scopes**: the fixed precedence order of configuration origins
//! - **Values**: JSON-shaped preference values and the overlay merge rule
//! - **Results**: resolution outcomes with provenance, per-scope inspections
//! - **Changes**: the change/batch types providers report to the engine
//! - **Schema contract**: scope-eligibility lookups consulted by the engine
//! - **Events**: a synchronous typed publish/subscribe channel

pub mod change;
pub mod error;
pub mod event;
pub mod resolved;
pub mod schema;
pub mod scope;
pub mod value;

pub use change::{ChangeBatch, PreferenceChange};
pub use error::{Error, Result};
pub use event::{Emitter, Subscription};
pub use resolved::{PreferenceInspection, ResolveResult, ResolvedPreference};
pub use schema::{PreferenceSchema, SchemaRegistry};
pub use scope::Scope;
pub use value::{PreferenceValue, overlay_value, value_at_path};
