//! Provider contract and in-memory backend for Preference Manager.
//!
//! A provider backs exactly one [`pref_model::Scope`] with raw values and
//! change notifications. The engine owns one provider reference per scope
//! for its lifetime and reaches every backing store through the
//! [`PreferenceProvider`] contract; file-backed providers live in their
//! own crates, while [`MemoryPreferenceProvider`] ships here as a
//! lightweight backend and as the standard fixture of the test suites.

pub mod error;
pub mod memory;
pub mod provider;

pub use error::{Error, Result};
pub use memory::MemoryPreferenceProvider;
pub use provider::{ChangeHandler, PreferenceProvider, ProviderResolution};
