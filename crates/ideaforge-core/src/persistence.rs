//! Snapshot persistence interfaces.
//!
//! A workspace is persisted as one [`PersistedSnapshot`] record per storage
//! tier, stored under a single well-known key.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::evolution::EvolutionLog;
use crate::workspace::{Feature, Node, SessionSummary, WorkspaceState};

/// Default key under which the workspace snapshot is stored in every tier.
pub const DEFAULT_SNAPSHOT_KEY: &str = "ideaforge.workspace";

/// Mind map portion of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapData {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// Flat serialized record of a [`WorkspaceState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub dream_statement: Option<String>,
    #[serde(default)]
    pub mind_map_data: MindMapData,
    #[serde(default)]
    pub session_summary: SessionSummary,
    /// Time the snapshot was taken (RFC 3339).
    pub timestamp: String,
    #[serde(default)]
    pub target_market: Option<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub idea_evolution: EvolutionLog,
}

impl PersistedSnapshot {
    /// Captures `state` with the current time.
    pub fn capture(state: &WorkspaceState) -> Self {
        Self {
            dream_statement: state.dream_statement().map(str::to_string),
            mind_map_data: MindMapData {
                nodes: state.nodes().to_vec(),
            },
            session_summary: state.session_summary(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            target_market: state.target_market().map(str::to_string),
            next_steps: state.next_steps().to_vec(),
            features: state.features().to_vec(),
            idea_evolution: state.idea_evolution().clone(),
        }
    }

    /// Rebuilds the workspace. The summary is recomputed from the nodes.
    pub fn into_state(self) -> WorkspaceState {
        let state = WorkspaceState::from_parts(
            self.dream_statement,
            self.target_market,
            self.mind_map_data.nodes,
            self.idea_evolution,
            self.features,
            self.next_steps,
        );
        if state.session_summary() != self.session_summary {
            tracing::warn!(
                "[PersistedSnapshot] Stored summary {:?} disagrees with nodes, using {:?}",
                self.session_summary,
                state.session_summary()
            );
        }
        state
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// One key-value backing store.
///
/// Implementations are synchronous: persistence runs inside the pipeline's
/// atomic merge step, after the only suspension point.
pub trait SnapshotTier: Send + Sync {
    /// Short name used in logs ("session", "local").
    fn name(&self) -> &str;

    /// Returns the stored value, or `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
