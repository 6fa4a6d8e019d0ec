//! Single-entry mutation helpers: rename and directory creation.

use crate::backend::Backend;
use crate::error::{ErrorCode, OpError, OpResult};
use crate::model::{Entry, FsCaps};

/// Rename the single selected entry to `new_name`.
///
/// Returns `None` (a silent no-op) when the request is rejected outright:
/// not exactly one entry selected, the parent pseudo-entry, an empty name,
/// or an unchanged name. Otherwise the backend's verdict is returned
/// verbatim; the rename capability is assumed pre-filtered by the caller.
pub fn rename_entry(
    backend: &mut dyn Backend,
    selection: &[Entry],
    new_name: &str,
) -> Option<OpResult<()>> {
    if selection.len() != 1 {
        return None;
    }
    let entry = &selection[0];
    if entry.is_parent_ref() || new_name.is_empty() || new_name == entry.name {
        return None;
    }
    Some(backend.rename_file(entry, new_name))
}

/// Create a directory named `name` in the backend's current directory.
///
/// Gated on the mkdir capability. On success the caller is expected to
/// refresh its listing and highlight the new entry; on failure it should
/// refresh anyway, since the backend's state is the source of truth.
pub fn create_directory(backend: &mut dyn Backend, name: &str) -> OpResult<Entry> {
    if !backend.caps().has(FsCaps::MKDIR) {
        return Err(OpError::with_message(
            ErrorCode::NotImplementedYet,
            "filesystem cannot create directories",
        ));
    }
    if name.is_empty() {
        return Err(OpError::with_message(
            ErrorCode::DirError,
            "empty directory name",
        ));
    }
    backend.mkdir(name)
}
