//! Batch deletion engine.
//!
//! Deletes a selection of entries, preferring the trash/recycle-bin
//! mechanism and falling back to permanent deletion when the caller
//! confirms it. Two confirmations are batch-scoped and threaded through an
//! explicit accumulator rather than shared mutable state: the
//! recursive-deletion confirmation (asked once for the first non-empty
//! directory) and the permanent-deletion confirmation (asked once after the
//! first trash failure).
//!
//! The trash preference is an explicit parameter of the call, and the
//! permanent retry passes `use_trash = false` for that one backend call;
//! nothing process-wide is ever toggled.

use tracing::debug;

use crate::backend::Backend;
use crate::error::{EngineError, ErrorCode};
use crate::model::{BatchReport, Entry, EntryOutcome, FsCaps};
use crate::prompt::PromptHandler;

/// Per-batch deletion configuration.
#[derive(Debug, Clone, Copy)]
pub struct DeleteOptions {
    /// Prefer the trash/recycle bin over permanent removal.
    pub use_trash: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        DeleteOptions { use_trash: true }
    }
}

/// Confirmations already granted during this batch.
#[derive(Debug, Default, Clone, Copy)]
struct BatchConfirmations {
    recursive: bool,
    permanent: bool,
}

impl BatchConfirmations {
    /// Whether a permanent retry may proceed, asking at most once per batch.
    fn allow_permanent(&mut self, prompts: &mut dyn PromptHandler, name: &str) -> bool {
        if self.permanent {
            return true;
        }
        if prompts.confirm_permanent_delete(name) {
            self.permanent = true;
            true
        } else {
            false
        }
    }
}

/// Delete `entries` through `backend`.
///
/// Directory entries are delegated to [`Backend::delete_dir`]; image
/// filesystems answer `NotImplementedYet` there, with no side effects.
///
/// # Errors
/// Returns `EngineError` only when the batch cannot start (backend lacks
/// the delete capability). Per-entry failures are recorded in the report.
pub fn delete_many(
    backend: &mut dyn Backend,
    entries: &[Entry],
    options: DeleteOptions,
    prompts: &mut dyn PromptHandler,
) -> Result<BatchReport, EngineError> {
    if !backend.caps().has(FsCaps::DELETE) {
        return Err(EngineError::MissingCapability("delete"));
    }

    let mut report = BatchReport::new();
    let mut confirmed = BatchConfirmations::default();

    for entry in entries {
        if entry.is_parent_ref() {
            continue;
        }
        if entry.is_dir {
            delete_directory(backend, entry, options, prompts, &mut confirmed, &mut report);
        } else {
            delete_file(backend, entry, options, prompts, &mut confirmed, &mut report);
        }
    }

    report.finish();
    debug!(
        done = report.done_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        "delete batch finished"
    );
    Ok(report)
}

fn delete_file(
    backend: &mut dyn Backend,
    entry: &Entry,
    options: DeleteOptions,
    prompts: &mut dyn PromptHandler,
    confirmed: &mut BatchConfirmations,
    report: &mut BatchReport,
) {
    match backend.delete_file(entry, options.use_trash) {
        Ok(()) => report.record(EntryOutcome::done(entry)),
        Err(err) if err.is_trash_failure() => {
            if confirmed.allow_permanent(prompts, &entry.name) {
                match backend.delete_file(entry, false) {
                    Ok(()) => report.record(EntryOutcome::done(entry)),
                    Err(err) => report.record(EntryOutcome::failed(entry, &err)),
                }
            } else {
                report.record(EntryOutcome::failed(entry, &err));
            }
        }
        Err(err) => report.record(EntryOutcome::failed(entry, &err)),
    }
}

fn delete_directory(
    backend: &mut dyn Backend,
    entry: &Entry,
    options: DeleteOptions,
    prompts: &mut dyn PromptHandler,
    confirmed: &mut BatchConfirmations,
    report: &mut BatchReport,
) {
    // Only a directory with children is a recursive deletion; an empty one
    // needs no extra confirmation.
    if dir_has_children(backend, entry) && !confirmed.recursive {
        if prompts.confirm_recursive_delete(&entry.name) {
            confirmed.recursive = true;
        } else {
            report.record(EntryOutcome::skipped(entry, ErrorCode::DirNotEmpty));
            return;
        }
    }

    match backend.delete_dir(entry, options.use_trash) {
        Ok(()) => report.record(EntryOutcome::done(entry)),
        Err(err) if err.is_trash_failure() => {
            if confirmed.allow_permanent(prompts, &entry.name) {
                match backend.delete_dir(entry, false) {
                    Ok(()) => report.record(EntryOutcome::done(entry)),
                    Err(err) => report.record(EntryOutcome::failed(entry, &err)),
                }
            } else {
                report.record(EntryOutcome::failed(entry, &err));
            }
        }
        Err(err) => report.record(EntryOutcome::failed(entry, &err)),
    }
}

fn dir_has_children(backend: &mut dyn Backend, entry: &Entry) -> bool {
    backend.cd(entry);
    let listed = backend.dir(true);
    backend.cd_up();
    match listed {
        Ok(children) => children.iter().any(|e| !e.is_parent_ref()),
        // Unreadable: assume the worst and treat it as recursive.
        Err(_) => true,
    }
}
