//! User configuration: an optional `config.toml` plus platform default paths.
//!
//! Every section is optional. A missing file yields [`AppConfig::default`];
//! command-line flags are applied on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::{BaseDirs, ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

use crate::db::DB_FILE_NAME;

const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_DIR_NAME: &str = "logs";
/// Fallback folder beneath the home directory when no project dirs resolve.
const HOME_DATA_DIR_NAME: &str = ".kita-absence-tracker";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageSection,
    pub export: ExportSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Directory pre-filled in the export dialog.
    pub directory: Option<PathBuf>,
    pub open_after_export: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Directory holding the store file and the logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DB_FILE_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(LOG_DIR_NAME))
    }

    /// Where exported reports go by default: the configured directory, else
    /// the user's documents folder, else the home directory.
    pub fn export_dir(&self) -> PathBuf {
        if let Some(dir) = &self.export.directory {
            return dir.clone();
        }
        if let Some(user) = UserDirs::new() {
            if let Some(documents) = user.document_dir() {
                return documents.to_path_buf();
            }
            return user.home_dir().to_path_buf();
        }
        PathBuf::from(".")
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("de", "kita", "kita-absence-tracker")
}

pub fn default_config_path() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .ok_or_else(|| anyhow!("cannot resolve the user config directory"))
}

pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dirs) = project_dirs() {
        return Ok(dirs.data_dir().to_path_buf());
    }
    BaseDirs::new()
        .map(|base| base.home_dir().join(HOME_DATA_DIR_NAME))
        .ok_or_else(|| anyhow!("cannot resolve a home directory for application data"))
}

/// Read `path`, or return defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse config {}", path.display()))
}
