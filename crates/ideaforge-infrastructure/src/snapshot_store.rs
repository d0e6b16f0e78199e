//! Two-tier workspace snapshot persistence.
//!
//! The session tier is primary: writes to it must succeed and reads prefer
//! it. The local tier is a best-effort backup that is consulted only when
//! the session tier has nothing.

use ideaforge_core::error::Result;
use ideaforge_core::persistence::{PersistedSnapshot, SnapshotTier};
use ideaforge_core::workspace::WorkspaceState;
use std::sync::Arc;

/// Reads and writes the workspace snapshot across the session and local tiers.
#[derive(Clone)]
pub struct TieredSnapshotStore {
    key: String,
    session: Arc<dyn SnapshotTier>,
    local: Arc<dyn SnapshotTier>,
}

impl TieredSnapshotStore {
    pub fn new(
        key: impl Into<String>,
        session: Arc<dyn SnapshotTier>,
        local: Arc<dyn SnapshotTier>,
    ) -> Self {
        Self {
            key: key.into(),
            session,
            local,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Captures and writes `state`. See [`Self::write_snapshot`].
    pub fn write(&self, state: &WorkspaceState) -> Result<PersistedSnapshot> {
        let snapshot = PersistedSnapshot::capture(state);
        self.write_snapshot(&snapshot)?;
        Ok(snapshot)
    }

    /// Writes to the session tier, then to the local tier.
    ///
    /// A session tier failure is returned. A local tier failure is logged and
    /// swallowed.
    pub fn write_snapshot(&self, snapshot: &PersistedSnapshot) -> Result<()> {
        let serialized = snapshot.to_json()?;

        self.session.set(&self.key, &serialized).map_err(|e| {
            tracing::error!(
                "[TieredSnapshotStore] {} tier write failed for '{}': {}",
                self.session.name(),
                self.key,
                e
            );
            e
        })?;

        if let Err(e) = self.local.set(&self.key, &serialized) {
            tracing::warn!(
                "[TieredSnapshotStore] {} tier write failed for '{}' (ignored): {}",
                self.local.name(),
                self.key,
                e
            );
        }

        tracing::debug!(
            "[TieredSnapshotStore] Snapshot '{}' written at {}",
            self.key,
            snapshot.timestamp
        );
        Ok(())
    }

    /// Returns the session snapshot, else the local snapshot, else `None`.
    pub fn read_snapshot(&self) -> Option<PersistedSnapshot> {
        self.read_tier(self.session.as_ref())
            .or_else(|| self.read_tier(self.local.as_ref()))
    }

    /// Restores the workspace, or an empty one when no tier has a snapshot.
    pub fn read(&self) -> WorkspaceState {
        self.read_snapshot()
            .map(PersistedSnapshot::into_state)
            .unwrap_or_default()
    }

    /// Removes the session tier entry, leaving the local backup in place.
    pub fn clear_session(&self) -> Result<()> {
        self.session.remove(&self.key)
    }

    fn read_tier(&self, tier: &dyn SnapshotTier) -> Option<PersistedSnapshot> {
        let raw = match tier.get(&self.key) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(
                    "[TieredSnapshotStore] {} tier read failed for '{}': {}",
                    tier.name(),
                    self.key,
                    e
                );
                return None;
            }
        };

        match PersistedSnapshot::from_json(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(
                    "[TieredSnapshotStore] Discarding unreadable {} snapshot '{}': {}",
                    tier.name(),
                    self.key,
                    e
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for TieredSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredSnapshotStore")
            .field("key", &self.key)
            .field("session", &self.session.name())
            .field("local", &self.local.name())
            .finish()
    }
}
