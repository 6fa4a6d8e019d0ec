//! The filesystem backend contract the engines are written against.
//!
//! A backend abstracts one filesystem namespace: the host directory tree, or
//! the virtual filesystem inside a loaded container image. The engines drive
//! backends only through these verbs and never branch on the backend kind,
//! with one exception: export-format negotiation when extracting from an
//! image to the host (see [`needs_export_format`]).
//!
//! Exactly one backend is live per panel; switching a panel's root destroys
//! the old backend and constructs a new one. The engines never hold a
//! backend reference beyond one operation call sequence.

use crate::error::{ErrorCode, OpError, OpResult};
use crate::model::{BackendKind, Entry, Files, FsCaps};

/// One editable metadata field of an entry, as declared by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescription {
    /// Stable identifier of the field.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current value, rendered as text.
    pub value: String,
}

/// A filesystem namespace with a current directory.
///
/// Mutating verbs return [`OpResult`]; they never panic. A backend is
/// mutated only through its own verbs and only by the engine driving it,
/// one operation at a time.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Capabilities of this backend instance. Queried before mutations.
    fn caps(&self) -> FsCaps;

    /// Change into `entry`. Fails silently if it is not a directory.
    /// The parent pseudo-entry navigates up.
    fn cd(&mut self, entry: &Entry);

    fn cd_up(&mut self);

    /// List the current directory. A parent pseudo-entry is prepended when
    /// the current directory is below the root.
    fn dir(&mut self, include_deleted: bool) -> OpResult<Files>;

    /// Read the whole content of `entry`, translated to `format_id` when the
    /// backend supports export formats (empty string: native bytes).
    fn get_file(&mut self, entry: &Entry, format_id: &str) -> OpResult<Vec<u8>>;

    /// Write `data` as a file named after `entry` in the current directory.
    /// Without `force_overwrite`, an existing file yields
    /// [`ErrorCode::FileAlreadyExists`].
    fn put_file(
        &mut self,
        entry: &Entry,
        format_id: &str,
        data: &[u8],
        force_overwrite: bool,
    ) -> OpResult<()>;

    /// Create a directory in the current directory and return its entry.
    fn mkdir(&mut self, name: &str) -> OpResult<Entry>;

    /// Delete a non-directory entry. With `use_trash`, prefer the recycle
    /// bin; a trash-mechanism failure is signalled via
    /// [`OpError::is_trash_failure`].
    fn delete_file(&mut self, entry: &Entry, use_trash: bool) -> OpResult<()>;

    /// Delete a directory and its contents. Image filesystems in scope do
    /// not support this and answer `NotImplementedYet` with no side effects.
    fn delete_dir(&mut self, _entry: &Entry, _use_trash: bool) -> OpResult<()> {
        Err(OpError::new(ErrorCode::NotImplementedYet))
    }

    fn rename_file(&mut self, entry: &Entry, new_name: &str) -> OpResult<()>;

    /// Dirty bit: set by any successful mutation, cleared only by a
    /// successful save.
    fn get_changed(&self) -> bool;

    fn reset_changed(&mut self);

    /// Export formats this backend's content can be translated to.
    fn save_file_formats(&self) -> Vec<String>;

    /// Human-readable description of an entry.
    fn file_info(&mut self, entry: &Entry) -> String;

    /// Editable metadata fields of an entry, in declaration order.
    fn file_get_metadata(&mut self, entry: &Entry) -> Vec<ParameterDescription>;

    /// Apply new values to the fields declared by `file_get_metadata`.
    fn file_set_metadata(&mut self, entry: &Entry, values: &[String]) -> OpResult<()>;
}

/// The single point where backend kinds matter: extracting from a non-host
/// source to a host target requires the caller to resolve a concrete export
/// format (one of the source's `save_file_formats`) once per batch.
pub fn needs_export_format(source: &dyn Backend, target: &dyn Backend) -> bool {
    target.kind() == BackendKind::Host && source.kind() != BackendKind::Host
}
