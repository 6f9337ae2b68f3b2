//! Error types for pref-model

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown scope: {scope}")]
    UnknownScope { scope: String },
}
