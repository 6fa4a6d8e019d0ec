//! Container-image persistence.
//!
//! Serializes an in-memory container image back to bytes through a
//! format-specific writer and puts them on disk, either in place (with
//! numbered backup rotation) or to a new path with an optional byte-range
//! template splice. The backend's dirty flag is cleared only after a
//! successful write of the format the backend's live state reflects.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::backend::Backend;
use crate::error::{EngineError, ErrorCode, OpError, OpResult};

/// Format identifier of the raw sector-dump container, the one format that
/// supports in-place rewriting.
pub const RAW_FORMAT: &str = "raw";

/// Bytes per track in the raw container: 16 sectors of 256 bytes.
pub const TRACK_BYTES: usize = 16 * 256;

/// An in-memory container image plus its source path and loaded format.
///
/// The image owns its backing buffer exclusively; the filesystem backend
/// built on top of it borrows it while loaded and must not outlive it.
#[derive(Debug, Clone)]
pub struct DiskImage {
    /// Path the image was loaded from and is saved back to.
    pub path: PathBuf,
    /// Identifier of the currently-loaded container format.
    pub format_id: String,
    /// The full container bytes.
    pub data: Vec<u8>,
}

impl DiskImage {
    pub fn new(path: impl Into<PathBuf>, format_id: impl Into<String>, data: Vec<u8>) -> Self {
        DiskImage {
            path: path.into(),
            format_id: format_id.into(),
            data,
        }
    }
}

/// Serializes a [`DiskImage`] into one concrete container format.
pub trait ImageWriter {
    /// Identifier of the format this writer produces.
    fn format_id(&self) -> &str;

    /// Serialize the image to a byte buffer.
    fn write(&self, image: &DiskImage) -> OpResult<Vec<u8>>;

    /// Replace everything past the first `tracks` tracks of `buffer` with
    /// the corresponding range of `template`. The template must match the
    /// target format's type and size contract exactly.
    fn substitute_tracks(
        &self,
        buffer: &mut Vec<u8>,
        template: &[u8],
        tracks: usize,
    ) -> OpResult<()>;
}

/// Writer for the raw sector-dump container: a byte-for-byte dump.
pub struct RawWriter;

impl ImageWriter for RawWriter {
    fn format_id(&self) -> &str {
        RAW_FORMAT
    }

    fn write(&self, image: &DiskImage) -> OpResult<Vec<u8>> {
        if image.data.is_empty() {
            return Err(OpError::new(ErrorCode::ImageNotLoaded));
        }
        Ok(image.data.clone())
    }

    fn substitute_tracks(
        &self,
        buffer: &mut Vec<u8>,
        template: &[u8],
        tracks: usize,
    ) -> OpResult<()> {
        if template.len() != buffer.len() {
            return Err(OpError::new(ErrorCode::WriteIncorrectTemplate));
        }
        let keep = tracks.saturating_mul(TRACK_BYTES);
        if keep > buffer.len() {
            return Err(OpError::new(ErrorCode::WriteIncorrectSource));
        }
        buffer[keep..].copy_from_slice(&template[keep..]);
        Ok(())
    }
}

/// Per-save configuration.
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    /// Rotate the existing file to a numbered backup before writing.
    pub make_backups: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions { make_backups: true }
    }
}

/// Save the image back to the path it was loaded from.
///
/// Only valid for the raw container format. Does nothing and returns
/// `Ok(false)` when the backend reports no unsaved changes. With backups
/// enabled, the existing file is rotated to the first free `base.N.ext`
/// slot before the new content is written; a backup slot is never reused,
/// so no history is ever overwritten.
///
/// Returns `Ok(true)` after a successful write; the backend's dirty flag
/// is cleared then and only then.
pub fn save_in_place(
    image: &DiskImage,
    backend: &mut dyn Backend,
    writer: &dyn ImageWriter,
    options: SaveOptions,
) -> Result<bool, EngineError> {
    if image.format_id != RAW_FORMAT || writer.format_id() != RAW_FORMAT {
        return Err(EngineError::SaveUnsupported {
            format: image.format_id.clone(),
        });
    }
    if !backend.get_changed() {
        debug!(path = %image.path.display(), "image unchanged, nothing to save");
        return Ok(false);
    }

    let buffer = writer.write(image).map_err(EngineError::Writer)?;

    if options.make_backups && image.path.exists() {
        let backup = rotate_backup(&image.path)?;
        debug!(backup = %backup.display(), "rotated previous image");
    }

    fs::write(&image.path, &buffer).map_err(|e| EngineError::ImageWrite {
        path: image.path.clone(),
        source: e,
    })?;
    backend.reset_changed();
    Ok(true)
}

/// Save the image to `output` through `writer`, optionally splicing a
/// byte-range template past the first `tracks` tracks.
///
/// Template failures (wrong template, insufficient source data) are
/// reported before any output file is written. The backend's dirty flag is
/// cleared only when the written format is the one the backend's live
/// state reflects.
pub fn save_as(
    image: &DiskImage,
    backend: &mut dyn Backend,
    writer: &dyn ImageWriter,
    output: &Path,
    template: Option<&Path>,
    tracks: usize,
) -> Result<(), EngineError> {
    let mut buffer = writer.write(image).map_err(EngineError::Writer)?;

    if let Some(template_path) = template {
        if tracks > 0 {
            let template_bytes =
                fs::read(template_path).map_err(|e| EngineError::TemplateRead {
                    path: template_path.to_path_buf(),
                    source: e,
                })?;
            writer
                .substitute_tracks(&mut buffer, &template_bytes, tracks)
                .map_err(EngineError::Writer)?;
        }
    }

    fs::write(output, &buffer).map_err(|e| EngineError::ImageWrite {
        path: output.to_path_buf(),
        source: e,
    })?;

    if writer.format_id() == image.format_id {
        backend.reset_changed();
    }
    Ok(())
}

/// Move `path` aside to the first free numbered backup slot
/// (`base.1.ext`, `base.2.ext`, ...) and return the slot used.
///
/// The slot is claimed with a hard link, which fails if the name already
/// exists, so two concurrent rotations can never pick the same slot. On
/// filesystems without hard links, falls back to probe-then-rename.
fn rotate_backup(path: &Path) -> Result<PathBuf, EngineError> {
    let mut number = 1u32;
    loop {
        let candidate = backup_candidate(path, number);
        match fs::hard_link(path, &candidate) {
            Ok(()) => {
                fs::remove_file(path).map_err(|e| EngineError::BackupFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                number += 1;
            }
            Err(_) => return rotate_backup_by_rename(path),
        }
    }
}

fn rotate_backup_by_rename(path: &Path) -> Result<PathBuf, EngineError> {
    let mut number = 1u32;
    loop {
        let candidate = backup_candidate(path, number);
        if !candidate.exists() {
            fs::rename(path, &candidate).map_err(|e| EngineError::BackupFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
            return Ok(candidate);
        }
        number += 1;
    }
}

fn backup_candidate(path: &Path, number: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}.{number}");
    if let Some(ext) = path.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_candidate_names() {
        let base = Path::new("/imgs/a.dsk");
        assert_eq!(backup_candidate(base, 1), Path::new("/imgs/a.1.dsk"));
        assert_eq!(backup_candidate(base, 12), Path::new("/imgs/a.12.dsk"));

        let no_ext = Path::new("/imgs/disk");
        assert_eq!(backup_candidate(no_ext, 2), Path::new("/imgs/disk.2"));
    }

    #[test]
    fn test_rotate_backup_takes_first_free_slot() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("a.dsk");
        fs::write(&path, b"current").expect("Failed to write");
        fs::write(temp_dir.path().join("a.1.dsk"), b"first").expect("Failed to write");
        fs::write(temp_dir.path().join("a.2.dsk"), b"second").expect("Failed to write");

        let backup = rotate_backup(&path).expect("rotation failed");

        assert_eq!(backup, temp_dir.path().join("a.3.dsk"));
        assert_eq!(fs::read(&backup).unwrap(), b"current");
        assert_eq!(fs::read(temp_dir.path().join("a.1.dsk")).unwrap(), b"first");
        assert_eq!(fs::read(temp_dir.path().join("a.2.dsk")).unwrap(), b"second");
        assert!(!path.exists());
    }

    #[test]
    fn test_substitute_tracks_checks_template_size() {
        let writer = RawWriter;
        let mut buffer = vec![0u8; TRACK_BYTES * 4];
        let template = vec![1u8; TRACK_BYTES * 3];

        let err = writer
            .substitute_tracks(&mut buffer, &template, 2)
            .expect_err("Expected template mismatch");
        assert_eq!(err.code, ErrorCode::WriteIncorrectTemplate);
        // Buffer untouched.
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_substitute_tracks_checks_source_span() {
        let writer = RawWriter;
        let mut buffer = vec![0u8; TRACK_BYTES * 2];
        let template = vec![1u8; TRACK_BYTES * 2];

        let err = writer
            .substitute_tracks(&mut buffer, &template, 3)
            .expect_err("Expected source mismatch");
        assert_eq!(err.code, ErrorCode::WriteIncorrectSource);
    }

    #[test]
    fn test_substitute_tracks_splices_tail() {
        let writer = RawWriter;
        let mut buffer = vec![0u8; TRACK_BYTES * 3];
        let template = vec![1u8; TRACK_BYTES * 3];

        writer
            .substitute_tracks(&mut buffer, &template, 1)
            .expect("substitution failed");

        assert!(buffer[..TRACK_BYTES].iter().all(|&b| b == 0));
        assert!(buffer[TRACK_BYTES..].iter().all(|&b| b == 1));
    }

    #[test]
    fn test_raw_writer_requires_loaded_image() {
        let writer = RawWriter;
        let image = DiskImage::new("a.dsk", RAW_FORMAT, Vec::new());
        let err = writer.write(&image).expect_err("Expected unloaded error");
        assert_eq!(err.code, ErrorCode::ImageNotLoaded);
    }
}
