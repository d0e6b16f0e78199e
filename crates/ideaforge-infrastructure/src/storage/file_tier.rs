//! Durable local tier: one JSON file per key.

use ideaforge_core::error::{IdeaforgeError, Result};
use ideaforge_core::persistence::SnapshotTier;
use std::path::{Path, PathBuf};

use super::atomic_file::AtomicFile;
use crate::paths::IdeaforgePaths;

/// File-backed key-value store that outlives the process.
#[derive(Debug, Clone)]
pub struct FileTier {
    name: String,
    dir: PathBuf,
}

impl FileTier {
    /// Creates a tier rooted at `dir`. The directory is created on first write.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            name: "local".to_string(),
            dir: dir.into(),
        }
    }

    /// Creates a tier in the platform data directory.
    pub fn default_location() -> Result<Self> {
        let dir = IdeaforgePaths::workspace_dir().map_err(|e| IdeaforgeError::config(e.to_string()))?;
        Ok(Self::with_dir(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> Result<AtomicFile> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            && !key.starts_with('.');
        if !valid {
            return Err(IdeaforgeError::invalid_value(format!(
                "storage key '{}' is not a safe file name",
                key
            )));
        }
        Ok(AtomicFile::new(self.dir.join(format!("{}.json", key))))
    }
}

impl SnapshotTier for FileTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.file_for(key)?.load()?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.file_for(key)?.save(value)?)
    }

    fn remove(&self, key: &str) -> Result<()> {
        Ok(self.file_for(key)?.remove()?)
    }
}
