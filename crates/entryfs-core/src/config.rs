//! Configuration for the IO factory.
//!
//! Loaded from TOML, every field optional:
//!
//! ```toml
//! temp_dir = "/var/tmp/entryfs"
//! temp_prefix = "upload"
//! compression = "stored"
//! folder_mode = "0750"
//! ```
//!
//! The value is handed to [`Io::new`](crate::Io::new); nothing reads it from
//! a global.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vfs::Permissions;

/// Compression method for archives written by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoConfig {
    /// Directory for temp files; the platform temp dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    /// Prefix for temp file names when the caller passes none.
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,
    #[serde(default)]
    pub compression: Compression,
    /// Octal mode for folders the local backend creates, e.g. `"0755"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_mode: Option<String>,
}

fn default_temp_prefix() -> String {
    "tmp".to_string()
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            temp_prefix: default_temp_prefix(),
            compression: Compression::default(),
            folder_mode: None,
        }
    }
}

impl IoConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        // Reject a bad mode at load time rather than on the first mkdir.
        config.folder_permissions()?;
        Ok(config)
    }

    /// Parsed `folder_mode`.
    pub fn folder_permissions(&self) -> Result<Option<Permissions>> {
        self.folder_mode.as_deref().map(str::parse).transpose()
    }
}
