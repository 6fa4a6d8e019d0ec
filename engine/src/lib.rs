//! # dskcmd Engine - Dual-Pane Commander Core
//!
//! A headless file-operation engine for a dual-pane commander that spans
//! two independently-rooted namespaces: the host filesystem and the virtual
//! filesystem inside a loaded disk-image container.
//! Designed as the foundation for multiple UIs (CLI, GUI, automation).
//!
//! ## Overview
//!
//! The engine drives two filesystem backends through a small capability
//! contract and provides:
//! - Recursive, format-aware, conflict-resolving copy between any two
//!   backends (host↔host, image↔image, or mixed)
//! - Batch deletion with a trash-to-permanent fallback ladder
//! - Capability-gated rename and directory creation
//! - Image persistence with numbered backup rotation and save-as with
//!   byte-range template splicing
//! - A closed error-code taxonomy with a user-facing decoder
//!
//! Decision points (overwrite? continue? delete permanently?) reach the
//! caller through the [`PromptHandler`] trait, decoupled from any UI
//! technology. Every operation runs synchronously to completion on the
//! caller's thread; cancellation happens only at those decision points.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{transfer, Backend, ConflictChoice, HostBackend, PromptHandler};
//!
//! struct SkipAll;
//!
//! impl PromptHandler for SkipAll {
//!     fn resolve_conflict(&mut self, _name: &str) -> ConflictChoice {
//!         ConflictChoice::Skip
//!     }
//!     fn continue_after_mkdir_failure(&mut self, _name: &str, _error: &str) -> bool {
//!         false
//!     }
//!     fn confirm_recursive_delete(&mut self, _name: &str) -> bool {
//!         false
//!     }
//!     fn confirm_permanent_delete(&mut self, _name: &str) -> bool {
//!         false
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = HostBackend::new("/data/incoming")?;
//! let mut target = HostBackend::new("/data/archive")?;
//! let entries = source.dir(false)?;
//!
//! let report = transfer(&mut source, &mut target, &entries, "", &mut SkipAll)?;
//! println!(
//!     "{} done, {} skipped, {} failed",
//!     report.done_count(),
//!     report.skipped_count(),
//!     report.failed_count()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (Entry, FsCaps, BatchReport, enums)
//! - **error**: The closed result-code taxonomy, decoder, and engine errors
//! - **backend**: The filesystem backend contract
//! - **host**: The host-filesystem backend implementation
//! - **transfer**: Recursive cross-filesystem copy
//! - **deletion**: Batch deletion with the trash fallback ladder
//! - **ops**: Rename and directory-creation helpers
//! - **image**: Container-image persistence and backup rotation
//! - **config**: Persistent settings (TOML)
//! - **prompt**: Decision-prompt trait

pub mod backend;
pub mod config;
pub mod deletion;
pub mod error;
pub mod host;
pub mod image;
pub mod model;
pub mod ops;
pub mod prompt;
pub mod transfer;

// Re-export main types and functions
pub use backend::{needs_export_format, Backend, ParameterDescription};
pub use config::Config;
pub use deletion::{delete_many, DeleteOptions};
pub use error::{decode, EngineError, ErrorCode, OpError, OpResult, TRASH_FAILED};
pub use host::HostBackend;
pub use image::{
    save_as, save_in_place, DiskImage, ImageWriter, RawWriter, SaveOptions, RAW_FORMAT,
    TRACK_BYTES,
};
pub use model::{
    BackendKind, BatchReport, ConflictChoice, Entry, EntryOutcome, EntryStatus, Files, FsCaps,
    PARENT_REF,
};
pub use ops::{create_directory, rename_entry};
pub use prompt::PromptHandler;
pub use transfer::transfer;
