//! Cross-filesystem transfer engine.
//!
//! Copies a selection of entries from one backend into another, recursively
//! and depth-first, in input order. Abort granularity differs by error
//! class: structural failures (a directory cannot be created and the caller
//! declines to continue, or the backend/format pair cannot write at all)
//! abort the whole batch, because continuing would produce an incomplete
//! subtree; per-file content failures are isolated and the batch continues
//! with the next sibling.
//!
//! The caller must refresh its view of the target after the batch returns;
//! intermediate state is not guaranteed consistent.

use tracing::debug;

use crate::backend::Backend;
use crate::error::{EngineError, ErrorCode};
use crate::model::{BatchReport, ConflictChoice, Entry, EntryOutcome, FsCaps};
use crate::prompt::PromptHandler;

/// Whether the rest of the batch should still run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Abort,
}

/// Copy `entries` from `source` into `target`'s current directory.
///
/// `export_format` is resolved once per batch by the caller (empty string
/// when no translation is needed) and applies to every entry, including
/// nested ones.
///
/// # Errors
/// Returns `EngineError` only when the batch cannot start (target lacks the
/// add capability). Per-entry failures are recorded in the report.
pub fn transfer(
    source: &mut dyn Backend,
    target: &mut dyn Backend,
    entries: &[Entry],
    export_format: &str,
    prompts: &mut dyn PromptHandler,
) -> Result<BatchReport, EngineError> {
    if !target.caps().has(FsCaps::ADD) {
        return Err(EngineError::MissingCapability("add"));
    }

    let mut report = BatchReport::new();
    let flow = put_entries(source, target, entries, export_format, prompts, &mut report)?;
    report.aborted = flow == Flow::Abort;
    report.finish();
    debug!(
        done = report.done_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        aborted = report.aborted,
        "transfer batch finished"
    );
    Ok(report)
}

fn put_entries(
    source: &mut dyn Backend,
    target: &mut dyn Backend,
    entries: &[Entry],
    format: &str,
    prompts: &mut dyn PromptHandler,
    report: &mut BatchReport,
) -> Result<Flow, EngineError> {
    for entry in entries {
        let flow = if entry.is_dir {
            if entry.is_parent_ref() {
                continue;
            }
            put_directory(source, target, entry, format, prompts, report)?
        } else {
            put_file(source, target, entry, format, prompts, report)
        };
        if flow == Flow::Abort {
            return Ok(Flow::Abort);
        }
    }
    Ok(Flow::Continue)
}

fn put_directory(
    source: &mut dyn Backend,
    target: &mut dyn Backend,
    entry: &Entry,
    format: &str,
    prompts: &mut dyn PromptHandler,
    report: &mut BatchReport,
) -> Result<Flow, EngineError> {
    match target.mkdir(&entry.name) {
        Ok(new_dir) => {
            report.record(EntryOutcome::done(entry));
            descend(source, target, entry, &new_dir, format, prompts, report)
        }
        Err(err) if err.code == ErrorCode::DirAlreadyExists => {
            // Reuse the existing directory so a re-run of a completed batch
            // places files instead of losing the whole subtree.
            let existing = target.dir(false).ok().and_then(|listing| {
                listing
                    .into_iter()
                    .find(|e| e.is_dir && e.name == entry.name)
            });
            match existing {
                Some(target_dir) => {
                    report.record(EntryOutcome::skipped(entry, ErrorCode::DirAlreadyExists));
                    descend(source, target, entry, &target_dir, format, prompts, report)
                }
                None => {
                    // Name taken by a non-directory: a structural failure.
                    report.record(EntryOutcome::failed(entry, &err));
                    if prompts.continue_after_mkdir_failure(&entry.name, &err.decoded()) {
                        Ok(Flow::Continue)
                    } else {
                        Ok(Flow::Abort)
                    }
                }
            }
        }
        Err(err) => {
            report.record(EntryOutcome::failed(entry, &err));
            if prompts.continue_after_mkdir_failure(&entry.name, &err.decoded()) {
                Ok(Flow::Continue)
            } else {
                Ok(Flow::Abort)
            }
        }
    }
}

/// List the source directory's children and transfer them into `target_dir`.
fn descend(
    source: &mut dyn Backend,
    target: &mut dyn Backend,
    source_dir: &Entry,
    target_dir: &Entry,
    format: &str,
    prompts: &mut dyn PromptHandler,
    report: &mut BatchReport,
) -> Result<Flow, EngineError> {
    source.cd(source_dir);
    let listed = source.dir(false);
    source.cd_up();

    let children = match listed {
        Ok(children) => children,
        Err(err) => {
            // Source unreadable: non-fatal, continue with the next sibling.
            report.record(EntryOutcome::failed(source_dir, &err));
            return Ok(Flow::Continue);
        }
    };

    target.cd(target_dir);
    let flow = put_entries(source, target, &children, format, prompts, report)?;
    target.cd_up();
    Ok(flow)
}

fn put_file(
    source: &mut dyn Backend,
    target: &mut dyn Backend,
    entry: &Entry,
    format: &str,
    prompts: &mut dyn PromptHandler,
    report: &mut BatchReport,
) -> Flow {
    let data = match source.get_file(entry, format) {
        Ok(data) => data,
        Err(err) => {
            debug!(name = %entry.name, error = %err, "source read failed");
            report.record(EntryOutcome::failed(entry, &err));
            return Flow::Continue;
        }
    };

    match target.put_file(entry, format, &data, false) {
        Ok(()) => {
            report.record(EntryOutcome::done(entry));
            Flow::Continue
        }
        Err(err) if err.code == ErrorCode::FileAlreadyExists => {
            match prompts.resolve_conflict(&entry.name) {
                ConflictChoice::Overwrite => {
                    match target.put_file(entry, format, &data, true) {
                        Ok(()) => report.record(EntryOutcome::done(entry)),
                        Err(err) => report.record(EntryOutcome::failed(entry, &err)),
                    }
                    Flow::Continue
                }
                ConflictChoice::Skip => {
                    report.record(EntryOutcome::skipped(entry, ErrorCode::FileAlreadyExists));
                    Flow::Continue
                }
                ConflictChoice::Cancel => {
                    report.record(EntryOutcome::skipped(entry, ErrorCode::FileAlreadyExists));
                    Flow::Abort
                }
            }
        }
        Err(err) if err.code == ErrorCode::NotImplementedYet => {
            // Hard capability gap for this backend/format pair; continuing
            // would fail every sibling the same way.
            report.record(EntryOutcome::failed(entry, &err));
            Flow::Abort
        }
        Err(err) => {
            report.record(EntryOutcome::failed(entry, &err));
            Flow::Continue
        }
    }
}
