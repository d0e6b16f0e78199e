//! The single in-memory owner of the workspace.
//!
//! Readers take snapshots. The only writer is [`WorkspaceStore::commit`],
//! which persists a fully merged draft before swapping it in and publishing.

use ideaforge_core::broadcast::{BroadcastBus, Subscription, WorkspaceEvent};
use ideaforge_core::config::WorkspaceConfig;
use ideaforge_core::error::Result;
use ideaforge_core::persistence::SnapshotTier;
use ideaforge_core::workspace::WorkspaceState;
use ideaforge_infrastructure::{FileTier, TieredSnapshotStore};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct WorkspaceStore {
    state: RwLock<WorkspaceState>,
    persistence: TieredSnapshotStore,
    bus: BroadcastBus,
}

impl WorkspaceStore {
    /// Creates a store holding an empty workspace.
    pub fn new(persistence: TieredSnapshotStore, bus: BroadcastBus) -> Self {
        Self {
            state: RwLock::new(WorkspaceState::new()),
            persistence,
            bus,
        }
    }

    /// Creates a store holding whatever the tiers currently persist.
    pub fn restore(persistence: TieredSnapshotStore, bus: BroadcastBus) -> Self {
        let state = persistence.read();
        tracing::info!(
            "[WorkspaceStore] Restored workspace ({} nodes, {} evolution entries)",
            state.nodes().len(),
            state.idea_evolution().len()
        );
        Self {
            state: RwLock::new(state),
            persistence,
            bus,
        }
    }

    /// Opens the store described by `config`, using `session` as the session
    /// tier and a file tier as the local backup.
    pub fn open(config: &WorkspaceConfig, session: Arc<dyn SnapshotTier>) -> Result<Self> {
        let local = match &config.data_dir {
            Some(dir) => FileTier::with_dir(dir),
            None => FileTier::default_location()?,
        };
        tracing::debug!(
            "[WorkspaceStore] Local tier at {}",
            local.dir().display()
        );
        let persistence = TieredSnapshotStore::new(&config.snapshot_key, session, Arc::new(local));
        Ok(Self::restore(persistence, BroadcastBus::new()))
    }

    /// Returns a copy of the current workspace.
    pub fn snapshot(&self) -> WorkspaceState {
        self.read_state().clone()
    }

    /// Runs `f` against the current workspace without copying it.
    pub fn with_state<R>(&self, f: impl FnOnce(&WorkspaceState) -> R) -> R {
        f(&self.read_state())
    }

    /// Reads the workspace back from the persistence tiers.
    pub fn read_persisted(&self) -> WorkspaceState {
        self.persistence.read()
    }

    pub fn bus(&self) -> &BroadcastBus {
        &self.bus
    }

    pub fn persistence(&self) -> &TieredSnapshotStore {
        &self.persistence
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&WorkspaceEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(callback)
    }

    /// Persists `draft`, makes it current, then publishes `event`.
    ///
    /// If the session tier rejects the write, the current workspace is left
    /// as it was and nothing is published. Returns the number of subscribers
    /// notified.
    pub fn commit(&self, draft: WorkspaceState, event: Option<WorkspaceEvent>) -> Result<usize> {
        self.persistence.write(&draft)?;
        *self.write_state() = draft;

        let notified = match event {
            Some(event) => {
                let notified = self.bus.publish(&event);
                tracing::debug!(
                    "[WorkspaceStore] Published {} to {} subscriber(s)",
                    event.kind(),
                    notified
                );
                notified
            }
            None => 0,
        };
        Ok(notified)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, WorkspaceState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, WorkspaceState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for WorkspaceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceStore")
            .field("persistence", &self.persistence)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}
