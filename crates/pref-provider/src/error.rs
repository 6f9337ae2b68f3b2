//! Error types for pref-provider

use pref_model::Scope;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Provider for {scope} scope failed to become ready: {reason}")]
    NotReady { scope: Scope, reason: String },

    #[error("Provider for {scope} scope failed to write {name}: {reason}")]
    WriteFailed {
        scope: Scope,
        name: String,
        reason: String,
    },
}
