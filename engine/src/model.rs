//! Core data model for the commander engines.
//!
//! This module defines the main data structures shared by the transfer and
//! deletion engines:
//! - Entry: a single directory item as reported by a backend listing
//! - FsCaps: the mutating capabilities a backend instance declares
//! - EntryOutcome / BatchReport: per-entry results of a batch operation
//! - BackendKind, EntryStatus, ConflictChoice: enums controlling behavior

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::error::{ErrorCode, OpError};

/// Name of the parent-reference pseudo-entry produced by directory listings.
pub const PARENT_REF: &str = "..";

/// One file or directory item in either backend.
///
/// Entries are value objects produced fresh by each listing; after any
/// mutation the caller must relist before using entry references again,
/// because names and positions may shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Display name in the backend's native encoding.
    pub name: String,

    /// True if this entry is a directory.
    pub is_dir: bool,

    /// Virtual filesystems may expose recoverable deleted entries.
    pub is_deleted: bool,

    /// Hint for how the content should be interpreted when previewed.
    pub type_preferred: String,

    /// File size in bytes (0 for directories).
    pub size: u64,

    /// Modification time, when the backend knows it.
    pub mtime: Option<SystemTime>,

    /// Opaque backend-specific locator (e.g. an absolute host path as bytes,
    /// or an on-disk location descriptor). Lets `cd`/`get_file` resolve an
    /// entry independently of the backend's current directory.
    pub metadata: Vec<u8>,
}

impl Entry {
    /// The `..` pseudo-entry prepended to listings below the root.
    pub fn parent_ref() -> Self {
        Entry {
            name: PARENT_REF.to_string(),
            is_dir: true,
            is_deleted: false,
            type_preferred: String::new(),
            size: 0,
            mtime: None,
            metadata: Vec::new(),
        }
    }

    pub fn is_parent_ref(&self) -> bool {
        self.name == PARENT_REF
    }
}

/// An ordered directory listing. Order is listing order, not sorted.
pub type Files = Vec<Entry>;

/// Bitset of the mutating operations a backend instance supports.
///
/// Queried before attempting a mutation; the engines never discover a
/// capability by probing failure, but still surface backend rejection if a
/// capability was mis-reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FsCaps(u8);

impl FsCaps {
    pub const NONE: FsCaps = FsCaps(0);
    /// Can create directories.
    pub const MKDIR: FsCaps = FsCaps(1 << 0);
    /// Can add/write files.
    pub const ADD: FsCaps = FsCaps(1 << 1);
    /// Can rename entries.
    pub const RENAME: FsCaps = FsCaps(1 << 2);
    /// Can delete entries.
    pub const DELETE: FsCaps = FsCaps(1 << 3);

    pub const fn all() -> FsCaps {
        FsCaps(Self::MKDIR.0 | Self::ADD.0 | Self::RENAME.0 | Self::DELETE.0)
    }

    /// True if every flag of `caps` is present in `self`.
    pub const fn has(self, caps: FsCaps) -> bool {
        self.0 & caps.0 == caps.0
    }
}

impl std::ops::BitOr for FsCaps {
    type Output = FsCaps;

    fn bitor(self, rhs: FsCaps) -> FsCaps {
        FsCaps(self.0 | rhs.0)
    }
}

/// The two backend families the engines drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// The host operating-system filesystem.
    Host,
    /// A virtual filesystem inside a loaded container image.
    Image,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Host => write!(f, "host"),
            BackendKind::Image => write!(f, "image"),
        }
    }
}

/// Answer to a name-conflict prompt during a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// Retry the write with overwrite enabled.
    Overwrite,
    /// Leave the existing file and continue with the next entry.
    Skip,
    /// Abort the remaining batch.
    Cancel,
}

/// Final state of one entry within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryStatus {
    /// Operation applied successfully.
    Done,
    /// Not applied, due to a user decision or an existing-entry condition.
    Skipped,
    /// Backend reported a failure.
    Failed,
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryStatus::Done => write!(f, "done"),
            EntryStatus::Skipped => write!(f, "skipped"),
            EntryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one entry within a batch operation.
#[derive(Debug, Clone, Serialize)]
pub struct EntryOutcome {
    /// Unique identifier of this outcome within the batch.
    pub id: Uuid,

    /// Entry name as it appeared in the input list.
    pub name: String,

    pub is_dir: bool,

    pub status: EntryStatus,

    /// Result code of the final attempt for this entry.
    pub code: ErrorCode,

    /// Decoded diagnostic for failed entries.
    pub message: Option<String>,
}

impl EntryOutcome {
    pub fn done(entry: &Entry) -> Self {
        EntryOutcome {
            id: Uuid::new_v4(),
            name: entry.name.clone(),
            is_dir: entry.is_dir,
            status: EntryStatus::Done,
            code: ErrorCode::Ok,
            message: None,
        }
    }

    pub fn skipped(entry: &Entry, code: ErrorCode) -> Self {
        EntryOutcome {
            id: Uuid::new_v4(),
            name: entry.name.clone(),
            is_dir: entry.is_dir,
            status: EntryStatus::Skipped,
            code,
            message: None,
        }
    }

    pub fn failed(entry: &Entry, error: &OpError) -> Self {
        EntryOutcome {
            id: Uuid::new_v4(),
            name: entry.name.clone(),
            is_dir: entry.is_dir,
            status: EntryStatus::Failed,
            code: error.code,
            message: Some(error.decoded()),
        }
    }
}

/// The ordered per-entry outcomes of one batch operation.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    /// Unique identifier for this batch.
    pub id: Uuid,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// True if the batch stopped before processing every entry.
    pub aborted: bool,

    pub outcomes: Vec<EntryOutcome>,
}

impl BatchReport {
    pub fn new() -> Self {
        BatchReport {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            aborted: false,
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, outcome: EntryOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn done_count(&self) -> usize {
        self.count(EntryStatus::Done)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(EntryStatus::Skipped)
    }

    pub fn failed_count(&self) -> usize {
        self.count(EntryStatus::Failed)
    }

    fn count(&self, status: EntryStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}
