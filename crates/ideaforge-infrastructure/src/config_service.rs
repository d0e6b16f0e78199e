//! Configuration service.
//!
//! Loads `RootConfig` from `~/.config/ideaforge/config.toml` and caches it.

use crate::paths::IdeaforgePaths;
use crate::storage::AtomicFile;
use ideaforge_core::config::RootConfig;
use ideaforge_core::error::{IdeaforgeError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Uses the platform config file. Loading is lazy.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses an explicit config file instead of the platform location.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the configuration, falling back to defaults if it cannot be loaded.
    pub fn get_config(&self) -> RootConfig {
        match self.try_get_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("[ConfigService] Using default configuration: {}", e);
                RootConfig::default()
            }
        }
    }

    /// Returns the configuration, loading and caching it on first access.
    ///
    /// A missing file yields defaults. A malformed file is an error.
    pub fn try_get_config(&self) -> Result<RootConfig> {
        if let Some(config) = self.cached().clone() {
            return Ok(config);
        }

        let loaded = self.load_config()?;
        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cached = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cached = None;
    }

    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => IdeaforgePaths::config_file().map_err(|e| IdeaforgeError::config(e.to_string())),
        }
    }

    fn cached(&self) -> std::sync::RwLockReadGuard<'_, Option<RootConfig>> {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_config(&self) -> Result<RootConfig> {
        let path = self.config_path()?;
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<RootConfig> {
        let Some(content) = AtomicFile::new(path.to_path_buf()).load()? else {
            tracing::debug!(
                "[ConfigService] No config at {}, using defaults",
                path.display()
            );
            return Ok(RootConfig::default());
        };

        let config: RootConfig = toml::from_str(&content).inspect_err(|e| {
            tracing::error!("[ConfigService] Invalid config file {}: {}", path.display(), e)
        })?;
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
