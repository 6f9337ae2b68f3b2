//! Write routing: pick the target scope for a set request and validate it
//! before the provider is touched.

use pref_model::{PreferenceSchema, Scope};

use crate::error::{Error, Result};

/// Scope a write lands in when the caller did not pick one: Workspace for
/// global writes, Folder when the write is anchored to a resource.
pub(crate) fn target_scope(explicit: Option<Scope>, resource: Option<&str>) -> Scope {
    match explicit {
        Some(scope) => scope,
        None if resource.is_none() => Scope::Workspace,
        None => Scope::Folder,
    }
}

/// Validate a write request. No provider is consulted; a failed
/// validation means no write was performed.
pub(crate) fn validate_write(
    schema: &dyn PreferenceSchema,
    name: &str,
    scope: Scope,
    resource: Option<&str>,
) -> Result<()> {
    if scope == Scope::User {
        let section = name.split_once('.').map_or(name, |(section, _)| section);
        if schema.is_workspace_only_section(section) {
            return Err(Error::SectionNotGlobal {
                name: name.to_string(),
                section: section.to_string(),
            });
        }
    }
    if scope == Scope::Folder && resource.is_none() {
        return Err(Error::NoResourceProvided {
            name: name.to_string(),
            scope,
        });
    }
    Ok(())
}
