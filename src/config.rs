//! Library configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app_meta::{APP_CONFIG_DIR_NAME, LIBRARY_DIR_ENV};
use crate::brush::{PresetStore, DEFAULT_THUMBNAIL_SIZE};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryConfig {
    /// Directory holding preset files and `index.json`
    pub storage_root: PathBuf,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// Pad group labels with narrow no-break spaces
    pub label_padding: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            storage_root: default_library_dir(),
            thumbnail_width: DEFAULT_THUMBNAIL_SIZE.0,
            thumbnail_height: DEFAULT_THUMBNAIL_SIZE.1,
            // The padding characters render badly with common Windows fonts
            label_padding: !cfg!(windows),
        }
    }
}

impl LibraryConfig {
    /// Reads a JSON config. Missing or malformed files yield the defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("Malformed library config {:?}: {}", path, err);
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!("Failed to read library config {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn store(&self) -> PresetStore {
        PresetStore::new(self.storage_root.clone())
            .with_thumbnail_size(self.thumbnail_width, self.thumbnail_height)
    }
}

/// `$BRUSHDECK_LIBRARY_DIR` if set, else `<data dir>/brushdeck/brushes`.
pub fn default_library_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(LIBRARY_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_CONFIG_DIR_NAME)
        .join("brushes")
}
