//! Host filesystem backend.
//!
//! Implements the [`Backend`] contract over the host operating-system
//! filesystem. The host supports the full capability set. Entry metadata
//! carries the absolute path as bytes, so `cd`, `get_file` and the deleting
//! verbs resolve entries independently of the current directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::backend::{Backend, ParameterDescription};
use crate::error::{EngineError, ErrorCode, OpError, OpResult};
use crate::model::{BackendKind, Entry, Files, FsCaps};

/// Backend over a host directory tree.
pub struct HostBackend {
    cwd: PathBuf,
    changed: bool,
}

impl HostBackend {
    /// Open a backend rooted at an existing directory.
    ///
    /// # Errors
    /// Returns `EngineError` if `dir` does not exist or is not a directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, EngineError> {
        let dir = dir.as_ref();
        match fs::metadata(dir) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(EngineError::NotADirectory {
                    path: dir.to_path_buf(),
                })
            }
            Err(_) => {
                return Err(EngineError::SourceNotFound {
                    path: dir.to_path_buf(),
                })
            }
        }

        let cwd = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        Ok(HostBackend {
            cwd,
            changed: false,
        })
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolve an entry to a host path, preferring its metadata locator.
    fn entry_path(&self, entry: &Entry) -> PathBuf {
        if entry.metadata.is_empty() {
            self.cwd.join(&entry.name)
        } else {
            PathBuf::from(String::from_utf8_lossy(&entry.metadata).into_owned())
        }
    }

    fn make_entry(path: &Path, metadata: &fs::Metadata) -> Entry {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Entry {
            name,
            is_dir: metadata.is_dir(),
            is_deleted: false,
            type_preferred: String::new(),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            mtime: metadata.modified().ok(),
            metadata: path.to_string_lossy().into_owned().into_bytes(),
        }
    }
}

impl Backend for HostBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Host
    }

    fn caps(&self) -> FsCaps {
        FsCaps::all()
    }

    fn cd(&mut self, entry: &Entry) {
        if entry.is_parent_ref() {
            self.cd_up();
            return;
        }
        let path = self.entry_path(entry);
        if path.is_dir() {
            self.cwd = path;
        }
    }

    fn cd_up(&mut self) {
        if let Some(parent) = self.cwd.parent() {
            self.cwd = parent.to_path_buf();
        }
    }

    fn dir(&mut self, _include_deleted: bool) -> OpResult<Files> {
        let mut entries = Files::new();
        if self.cwd.parent().is_some() {
            entries.push(Entry::parent_ref());
        }

        let read_dir = fs::read_dir(&self.cwd)
            .map_err(|e| OpError::with_message(ErrorCode::ReadError, e.to_string()))?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry
                .map_err(|e| OpError::with_message(ErrorCode::ReadError, e.to_string()))?;
            let metadata = dir_entry
                .metadata()
                .map_err(|e| OpError::with_message(ErrorCode::ReadError, e.to_string()))?;
            entries.push(Self::make_entry(&dir_entry.path(), &metadata));
        }
        Ok(entries)
    }

    fn get_file(&mut self, entry: &Entry, _format_id: &str) -> OpResult<Vec<u8>> {
        let path = self.entry_path(entry);
        fs::read(&path).map_err(|e| OpError::with_message(ErrorCode::ReadError, e.to_string()))
    }

    fn put_file(
        &mut self,
        entry: &Entry,
        _format_id: &str,
        data: &[u8],
        force_overwrite: bool,
    ) -> OpResult<()> {
        let dest = self.cwd.join(&entry.name);
        if dest.exists() && !force_overwrite {
            return Err(OpError::new(ErrorCode::FileAlreadyExists));
        }

        fs::write(&dest, data)
            .map_err(|e| OpError::with_message(ErrorCode::WriteError, e.to_string()))?;

        // Preserve the source entry's modification time when known.
        if let Some(mtime) = entry.mtime {
            let _ = filetime::set_file_mtime(&dest, filetime::FileTime::from_system_time(mtime));
        }

        self.changed = true;
        Ok(())
    }

    fn mkdir(&mut self, name: &str) -> OpResult<Entry> {
        let path = self.cwd.join(name);
        if path.exists() {
            return Err(OpError::new(ErrorCode::DirAlreadyExists));
        }
        fs::create_dir(&path)
            .map_err(|e| OpError::with_message(ErrorCode::DirError, e.to_string()))?;
        let metadata = fs::metadata(&path)
            .map_err(|e| OpError::with_message(ErrorCode::DirError, e.to_string()))?;
        self.changed = true;
        Ok(Self::make_entry(&path, &metadata))
    }

    fn delete_file(&mut self, entry: &Entry, use_trash: bool) -> OpResult<()> {
        let path = self.entry_path(entry);
        if use_trash {
            trash::delete(&path).map_err(OpError::trash_failed)?;
        } else {
            fs::remove_file(&path)
                .map_err(|e| OpError::with_message(ErrorCode::DeleteError, e.to_string()))?;
        }
        debug!(name = %entry.name, use_trash, "deleted host file");
        self.changed = true;
        Ok(())
    }

    fn delete_dir(&mut self, entry: &Entry, use_trash: bool) -> OpResult<()> {
        let path = self.entry_path(entry);
        if !path.is_dir() {
            return Err(OpError::with_message(
                ErrorCode::DirError,
                format!("directory '{}' not found", entry.name),
            ));
        }
        if use_trash {
            trash::delete(&path).map_err(OpError::trash_failed)?;
        } else {
            fs::remove_dir_all(&path)
                .map_err(|e| OpError::with_message(ErrorCode::DeleteError, e.to_string()))?;
        }
        debug!(name = %entry.name, use_trash, "deleted host directory");
        self.changed = true;
        Ok(())
    }

    fn rename_file(&mut self, entry: &Entry, new_name: &str) -> OpResult<()> {
        let from = self.entry_path(entry);
        let to = from
            .parent()
            .map(|p| p.join(new_name))
            .unwrap_or_else(|| self.cwd.join(new_name));
        if to.exists() {
            return Err(OpError::new(ErrorCode::FileAlreadyExists));
        }
        fs::rename(&from, &to)
            .map_err(|e| OpError::with_message(ErrorCode::RenameError, e.to_string()))?;
        self.changed = true;
        Ok(())
    }

    fn get_changed(&self) -> bool {
        self.changed
    }

    fn reset_changed(&mut self) {
        self.changed = false;
    }

    fn save_file_formats(&self) -> Vec<String> {
        // Host files need no export translation.
        Vec::new()
    }

    fn file_info(&mut self, entry: &Entry) -> String {
        let path = self.entry_path(entry);
        if entry.is_dir {
            let mut file_count = 0usize;
            let mut dir_count = 0usize;
            let mut total_size = 0u64;
            if let Ok(read_dir) = fs::read_dir(&path) {
                for dir_entry in read_dir.flatten() {
                    match dir_entry.metadata() {
                        Ok(md) if md.is_dir() => dir_count += 1,
                        Ok(md) => {
                            file_count += 1;
                            total_size += md.len();
                        }
                        Err(_) => {}
                    }
                }
            }
            format!(
                "Directory: {}\n\nPath: {}\nSubdirectories: {}\nFiles: {}\nTotal size: {} bytes\n",
                entry.name,
                path.display(),
                dir_count,
                file_count,
                total_size
            )
        } else {
            format!(
                "File: {}\n\nPath: {}\nSize: {} bytes\n",
                entry.name,
                path.display(),
                entry.size
            )
        }
    }

    fn file_get_metadata(&mut self, _entry: &Entry) -> Vec<ParameterDescription> {
        // Host entries expose no editable on-disk parameters.
        Vec::new()
    }

    fn file_set_metadata(&mut self, _entry: &Entry, _values: &[String]) -> OpResult<()> {
        Err(OpError::new(ErrorCode::NotImplementedYet))
    }
}
