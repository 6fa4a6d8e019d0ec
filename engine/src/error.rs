//! Error types for the commander engines.
//!
//! Two layers, mirroring how failures flow through the system:
//! - `OpError` / `OpResult`: the closed-taxonomy result every backend verb
//!   returns. Backend calls never panic; the engines inspect the code and
//!   branch on it explicitly. Only `FileAlreadyExists`, `NotImplementedYet`
//!   and the trash-failure signal change batch-level control flow.
//! - `EngineError`: job-level errors that prevent an operation from being
//!   executed at all (missing capability, unusable paths, save failures).

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Closed set of operation result codes reported by backends and writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Ok,
    NotImplementedYet,

    /// No space left for the file's content.
    FileAddNoSpace,
    /// No free directory entry for the file.
    FileAddNoDirEntry,
    /// No free sector could be allocated for the file.
    FileAddNoSector,

    /// No space left for the new directory.
    DirNoSpace,
    /// No free directory entry for the new directory.
    DirNoDirEntry,
    /// No free sector could be allocated for the new directory.
    DirNoSector,

    DirNotEmpty,
    FileAlreadyExists,
    DirAlreadyExists,
    /// Generic directory-creation failure.
    DirError,

    /// No container image is loaded.
    ImageNotLoaded,
    /// Unrecognized or damaged container format.
    BadImageFormat,
    /// Container file could not be loaded.
    LoadError,

    /// Template does not match the target format's type and size contract.
    WriteIncorrectTemplate,
    /// Source data does not cover the requested track span.
    WriteIncorrectSource,

    ReadError,
    WriteError,
    DeleteError,
    RenameError,
}

/// User-facing category message for a result code.
pub fn decode(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Ok => "No error",
        ErrorCode::NotImplementedYet => "Not implemented yet",
        ErrorCode::FileAddNoSpace | ErrorCode::DirNoSpace => "Not enough free space",
        ErrorCode::FileAddNoDirEntry | ErrorCode::DirNoDirEntry => {
            "Can't allocate a directory entry"
        }
        ErrorCode::FileAddNoSector | ErrorCode::DirNoSector => "Can't allocate a sector",
        ErrorCode::DirNotEmpty => "Directory is not empty",
        ErrorCode::FileAlreadyExists => "File already exists",
        ErrorCode::DirAlreadyExists => "Directory already exists",
        ErrorCode::DirError => "Error creating a directory",
        ErrorCode::ImageNotLoaded => "Image file is not loaded",
        ErrorCode::BadImageFormat => "Unrecognized disk format or disk is damaged",
        ErrorCode::LoadError => "Error loading disk image file",
        ErrorCode::WriteIncorrectTemplate => {
            "The template must be the same type and size as the target"
        }
        ErrorCode::WriteIncorrectSource => "Incorrect source data for track replacement",
        ErrorCode::ReadError => "Error reading file",
        ErrorCode::WriteError => "Error writing file",
        ErrorCode::DeleteError => "Error deleting file",
        ErrorCode::RenameError => "Error renaming file",
    }
}

/// Message prefix signalling that the trash mechanism failed, as opposed to
/// a generic delete failure. Distinguished by content, not by code.
pub const TRASH_FAILED: &str = "TRASH_FAILED";

/// Failure outcome of a single backend or writer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpError {
    pub code: ErrorCode,
    /// Optional free-text diagnostic supplied by the backend.
    pub message: String,
}

impl OpError {
    pub fn new(code: ErrorCode) -> Self {
        OpError {
            code,
            message: String::new(),
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        OpError {
            code,
            message: message.into(),
        }
    }

    /// A delete failure caused by the trash mechanism rather than the entry.
    pub fn trash_failed(detail: impl std::fmt::Display) -> Self {
        OpError::with_message(ErrorCode::DeleteError, format!("{TRASH_FAILED}: {detail}"))
    }

    pub fn is_trash_failure(&self) -> bool {
        self.message.starts_with(TRASH_FAILED)
    }

    /// Category message with the backend diagnostic appended, if any.
    pub fn decoded(&self) -> String {
        if self.message.is_empty() {
            decode(self.code).to_string()
        } else {
            format!("{}: {}", decode(self.code), self.message)
        }
    }
}

impl std::fmt::Display for OpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.decoded())
    }
}

impl std::error::Error for OpError {}

/// Result of a backend or writer call. `Err` carries the closed-taxonomy
/// failure; by construction a success never carries an error code.
pub type OpResult<T = ()> = Result<T, OpError>;

/// Errors that prevent an engine operation from being executed at all.
///
/// Per-entry failures are recorded in the batch report, not here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("backend does not declare the {0} capability")]
    MissingCapability(&'static str),

    #[error("in-place saving is not available for the '{format}' container format")]
    SaveUnsupported { format: String },

    #[error("backup rotation failed for {path}: {source}")]
    BackupFailed { path: PathBuf, source: io::Error },

    #[error("image writer failed: {0}")]
    Writer(OpError),

    #[error("error reading template file {path}: {source}")]
    TemplateRead { path: PathBuf, source: io::Error },

    #[error("error writing image file {path}: {source}")]
    ImageWrite { path: PathBuf, source: io::Error },

    #[error("configuration error: {0}")]
    Config(String),
}
