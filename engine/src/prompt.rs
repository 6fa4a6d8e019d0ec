//! Decision-prompt trait.
//!
//! This module defines the PromptHandler trait, which decouples the engines
//! from any specific UI technology (CLI, GUI, etc.). The engines call it at
//! the protocol-level checkpoints where a batch needs a user decision; there
//! is no other cancellation mechanism, so these calls are the only places a
//! running batch can stop early.
//!
//! All methods are called synchronously during batch execution. Handlers may
//! be stateful (e.g. counting prompts, or answering from pre-set flags).

use crate::model::ConflictChoice;

/// Receives the decision points of a running batch.
pub trait PromptHandler {
    /// A file with this name already exists at the target.
    fn resolve_conflict(&mut self, name: &str) -> ConflictChoice;

    /// Creating a directory failed with the decoded `error`. Returning
    /// `false` aborts the remaining batch.
    fn continue_after_mkdir_failure(&mut self, name: &str, error: &str) -> bool;

    /// `name` is a non-empty directory; confirm deleting it recursively.
    /// A `true` answer is remembered for the rest of the batch.
    fn confirm_recursive_delete(&mut self, name: &str) -> bool;

    /// Moving `name` to the trash failed; confirm deleting it permanently.
    /// A `true` answer is remembered for the rest of the batch.
    fn confirm_permanent_delete(&mut self, name: &str) -> bool;
}
