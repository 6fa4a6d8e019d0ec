//! Persistent engine configuration.
//!
//! Settings that survive across sessions: whether in-place saves rotate a
//! backup, whether deletions prefer the recycle bin, and the export format
//! last chosen for each source-backend kind (asked once per batch and
//! remembered for the next one). Stored as a TOML file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::EngineError;
use crate::model::BackendKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rotate the existing image to a numbered backup before saving.
    pub make_backups_on_save: bool,

    /// Prefer the trash/recycle bin over permanent deletion.
    pub use_recycle_bin: bool,

    /// Last export format chosen per source-backend kind.
    pub extract_formats: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            make_backups_on_save: true,
            use_recycle_bin: true,
            extract_formats: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load the configuration, falling back to defaults when the file does
    /// not exist.
    ///
    /// # Errors
    /// Returns `EngineError::Config` on unreadable or malformed files.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        match fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).map_err(|e| EngineError::Config(e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(EngineError::Config(e.to_string())),
        }
    }

    /// Write the configuration, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let text =
            toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| EngineError::Config(e.to_string()))?;
            }
        }
        fs::write(path, text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Export format remembered for sources of the given kind.
    pub fn extract_format_for(&self, kind: BackendKind) -> Option<&str> {
        self.extract_formats.get(&kind.to_string()).map(|s| s.as_str())
    }

    /// Remember the export format chosen for sources of the given kind.
    pub fn remember_extract_format(&mut self, kind: BackendKind, format: &str) {
        self.extract_formats
            .insert(kind.to_string(), format.to_string());
    }
}
