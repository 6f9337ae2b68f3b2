//! Preference scopes and their precedence order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One precedence tier of configuration origin.
///
/// Scopes form a fixed total order: `Default < User < Workspace < Folder`.
/// During resolution the scopes are walked in ascending order and a value
/// contributed by a higher scope takes precedence over the same name at a
/// lower scope. The set of scopes is closed; there are no dynamic tiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Built-in defaults contributed by the preference schema.
    #[default]
    Default,

    /// User-global settings.
    User,

    /// Workspace-wide settings.
    Workspace,

    /// Per-folder settings within a workspace.
    Folder,
}

impl Scope {
    /// Number of scopes. Scope-indexed tables are sized with this.
    pub const COUNT: usize = 4;

    const ORDERED: [Scope; Scope::COUNT] =
        [Scope::Default, Scope::User, Scope::Workspace, Scope::Folder];

    /// All scopes in precedence order, lowest first.
    pub fn ascending() -> impl DoubleEndedIterator<Item = Scope> {
        Self::ORDERED.into_iter()
    }

    /// All scopes in precedence order, highest first.
    pub fn descending() -> impl DoubleEndedIterator<Item = Scope> {
        Self::ORDERED.into_iter().rev()
    }

    /// Position of this scope in scope-indexed tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase scope name, as used in serialized form and log output.
    pub fn name(self) -> &'static str {
        match self {
            Scope::Default => "default",
            Scope::User => "user",
            Scope::Workspace => "workspace",
            Scope::Folder => "folder",
        }
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Scope::Default),
            "user" => Ok(Scope::User),
            "workspace" => Ok(Scope::Workspace),
            "folder" => Ok(Scope::Folder),
            _ => Err(Error::UnknownScope {
                scope: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
