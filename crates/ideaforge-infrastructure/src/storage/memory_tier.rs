//! Ephemeral session tier.

use ideaforge_core::error::Result;
use ideaforge_core::persistence::SnapshotTier;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// In-process key-value store that lives as long as the page session.
#[derive(Debug, Default)]
pub struct MemoryTier {
    name: String,
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A tier named "session".
    pub fn session() -> Self {
        Self::new("session")
    }

    /// Drops every entry, as when the browser session ends.
    pub fn clear(&self) {
        self.entries().clear();
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotTier for MemoryTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}
