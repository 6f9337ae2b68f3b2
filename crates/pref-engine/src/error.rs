//! Error types for pref-engine

use pref_model::Scope;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] pref_provider::Error),

    #[error("Preference service was disposed")]
    Disposed,

    #[error("No provider available for {scope} scope")]
    NoProviderForScope { scope: Scope },

    #[error("Cannot write {name} to {scope} scope: no resource provided")]
    NoResourceProvided { name: String, scope: Scope },

    #[error("Cannot write {name} to user scope: section '{section}' is workspace-only")]
    SectionNotGlobal { name: String, section: String },

    #[error("Provider for {scope} scope rejected the write to {name}")]
    WriteRejected { name: String, scope: Scope },
}
