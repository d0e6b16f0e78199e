use serde::{Deserialize, Serialize};

use super::catalog::{ActionCatalog, Prerequisite};
use crate::workspace::WorkspaceState;

/// Default number of vision + market + product nodes that must be exceeded
/// before validation is offered.
pub const DEFAULT_VALIDATION_THRESHOLD: usize = 2;

/// Badge shown next to a stage action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// The prerequisite exists.
    Ready,
    /// The conversation just suggested this action.
    Needed,
    /// No badge.
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReadiness {
    pub action_id: String,
    pub status: ActionStatus,
}

/// Output of [`StageReadinessGate::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub actions: Vec<ActionReadiness>,
    pub is_ready_for_validation: bool,
}

impl ReadinessReport {
    pub fn status_of(&self, action_id: &str) -> Option<ActionStatus> {
        self.actions
            .iter()
            .find(|a| a.action_id == action_id)
            .map(|a| a.status)
    }
}

/// Derives navigation readiness from the workspace.
///
/// `evaluate` reads its inputs only; equal inputs always give equal reports.
#[derive(Debug, Clone)]
pub struct StageReadinessGate {
    catalog: ActionCatalog,
    validation_threshold: usize,
}

impl StageReadinessGate {
    pub fn new(catalog: ActionCatalog, validation_threshold: usize) -> Self {
        Self {
            catalog,
            validation_threshold,
        }
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn validation_threshold(&self) -> usize {
        self.validation_threshold
    }

    pub fn evaluate(&self, state: &WorkspaceState, last_message_hint: Option<&str>) -> ReadinessReport {
        let ready_for_validation = is_ready_for_validation(state, self.validation_threshold);

        let actions = self
            .catalog
            .actions()
            .iter()
            .map(|action| {
                let status = if last_message_hint == Some(action.id.as_str()) {
                    ActionStatus::Needed
                } else if prerequisite_met(action.prerequisite, state, ready_for_validation) {
                    ActionStatus::Ready
                } else {
                    ActionStatus::Neutral
                };
                ActionReadiness {
                    action_id: action.id.clone(),
                    status,
                }
            })
            .collect();

        ReadinessReport {
            actions,
            is_ready_for_validation: ready_for_validation,
        }
    }
}

impl Default for StageReadinessGate {
    fn default() -> Self {
        Self::new(ActionCatalog::default(), DEFAULT_VALIDATION_THRESHOLD)
    }
}

/// True when vision + market + product nodes exceed `threshold`.
pub fn is_ready_for_validation(state: &WorkspaceState, threshold: usize) -> bool {
    let relevant = state
        .nodes()
        .iter()
        .filter(|node| node.node_type.is_validation_relevant())
        .count();
    relevant > threshold
}

fn prerequisite_met(prerequisite: Prerequisite, state: &WorkspaceState, ready_for_validation: bool) -> bool {
    match prerequisite {
        Prerequisite::CompletedStrategy => state.has_completed_strategy(),
        Prerequisite::ApprovedFeature => state.has_approved_feature(),
        Prerequisite::ValidationReady => ready_for_validation,
    }
}
