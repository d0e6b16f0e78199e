//! Unified path management for IdeaForge files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/ideaforge/          # Config directory
//! └── config.toml               # Application configuration
//!
//! ~/.local/share/ideaforge/     # Data directory
//! └── workspace/                # Local (durable) snapshot tier
//!     └── ideaforge.workspace.json
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "ideaforge";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Platform paths for IdeaForge.
pub struct IdeaforgePaths;

impl IdeaforgePaths {
    /// Returns the configuration directory (e.g. `~/.config/ideaforge/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the data directory (e.g. `~/.local/share/ideaforge/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the directory backing the local snapshot tier.
    pub fn workspace_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("workspace"))
    }
}
