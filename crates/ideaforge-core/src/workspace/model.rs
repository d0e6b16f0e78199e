//! Workspace domain models.
//!
//! `WorkspaceState` is the canonical business-concept model for one page
//! session. Its fields are private so that the derived `SessionSummary` can
//! only change together with the node list it summarizes.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::node::{Node, NodeType};
use crate::error::{IdeaforgeError, Result};
use crate::evolution::EvolutionLog;

/// Ordered collection of mind map nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMap {
    pub nodes: Vec<Node>,
}

impl MindMap {
    pub fn count(&self, node_type: NodeType) -> usize {
        self.nodes.iter().filter(|n| n.node_type == node_type).count()
    }

    pub fn contains(&self, node_type: NodeType, label: &str) -> bool {
        self.nodes
            .iter()
            .any(|n| n.node_type == node_type && n.label == label)
    }
}

/// Per-category node counts shown on the progress panel.
///
/// - `dream_elements`: vision and product nodes
/// - `user_personas`: market and persona nodes
/// - `general_ideas`: idea nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub dream_elements: usize,
    pub user_personas: usize,
    pub general_ideas: usize,
}

impl SessionSummary {
    /// Computes the summary from scratch.
    pub fn from_nodes(nodes: &[Node]) -> Self {
        nodes.iter().fold(Self::default(), |mut summary, node| {
            match node.node_type {
                NodeType::Vision | NodeType::Product => summary.dream_elements += 1,
                NodeType::Market | NodeType::Persona => summary.user_personas += 1,
                NodeType::Idea => summary.general_ideas += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.dream_elements + self.user_personas + self.general_ideas
    }
}

/// Review status of a feature.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeatureStatus {
    Pending,
    Approved,
    Rejected,
}

/// Clarification state attached to a feature by the planning views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationData {
    pub clarified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Category assigned to features discovered through conversation.
pub const CORE_FEATURE_CATEGORY: &str = "core";

/// A candidate product feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,
    pub name: String,
    pub status: FeatureStatus,
    pub category: String,
    #[serde(default)]
    pub clarification_data: ClarificationData,
}

impl Feature {
    /// Creates a pending `core` feature with a fresh id.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            status: FeatureStatus::Pending,
            category: CORE_FEATURE_CATEGORY.to_string(),
            clarification_data: ClarificationData::default(),
        }
    }
}

/// The canonical workspace model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceState {
    dream_statement: Option<String>,
    target_market: Option<String>,
    mind_map: MindMap,
    session_summary: SessionSummary,
    idea_evolution: EvolutionLog,
    features: Vec<Feature>,
    next_steps: Vec<String>,
}

impl WorkspaceState {
    /// Creates an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a workspace from stored parts.
    ///
    /// The summary is always recomputed from `nodes`; a stored summary is
    /// never trusted.
    pub fn from_parts(
        dream_statement: Option<String>,
        target_market: Option<String>,
        nodes: Vec<Node>,
        idea_evolution: EvolutionLog,
        features: Vec<Feature>,
        next_steps: Vec<String>,
    ) -> Self {
        let session_summary = SessionSummary::from_nodes(&nodes);
        Self {
            dream_statement,
            target_market,
            mind_map: MindMap { nodes },
            session_summary,
            idea_evolution,
            features,
            next_steps,
        }
    }

    // ============================================================================
    // Readers
    // ============================================================================

    pub fn dream_statement(&self) -> Option<&str> {
        self.dream_statement.as_deref()
    }

    pub fn target_market(&self) -> Option<&str> {
        self.target_market.as_deref()
    }

    pub fn mind_map(&self) -> &MindMap {
        &self.mind_map
    }

    pub fn nodes(&self) -> &[Node] {
        &self.mind_map.nodes
    }

    pub fn session_summary(&self) -> SessionSummary {
        self.session_summary
    }

    pub fn idea_evolution(&self) -> &EvolutionLog {
        &self.idea_evolution
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, feature_id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == feature_id)
    }

    pub fn next_steps(&self) -> &[String] {
        &self.next_steps
    }

    pub fn has_approved_feature(&self) -> bool {
        self.features
            .iter()
            .any(|f| f.status == FeatureStatus::Approved)
    }

    /// A strategy is complete once a target market and at least one next
    /// step are known.
    pub fn has_completed_strategy(&self) -> bool {
        self.target_market.is_some() && !self.next_steps.is_empty()
    }

    /// True when nothing has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.dream_statement.is_none()
            && self.target_market.is_none()
            && self.mind_map.nodes.is_empty()
            && self.idea_evolution.is_empty()
            && self.features.is_empty()
            && self.next_steps.is_empty()
    }

    // ============================================================================
    // Mutators (used by the merge step)
    // ============================================================================

    pub fn set_dream_statement(&mut self, concept: impl Into<String>) {
        self.dream_statement = Some(concept.into());
    }

    pub fn set_target_market(&mut self, market: impl Into<String>) {
        self.target_market = Some(market.into());
    }

    pub fn set_next_steps(&mut self, steps: Vec<String>) {
        self.next_steps = steps;
    }

    /// Adds a node unless one with the same type and label exists.
    ///
    /// Returns the label when a node was added. The summary is updated in the
    /// same call.
    pub fn add_node(&mut self, node_type: NodeType, label: &str) -> Option<String> {
        if self.mind_map.contains(node_type, label) {
            return None;
        }
        self.mind_map.nodes.push(Node::new(node_type, label));
        self.session_summary = SessionSummary::from_nodes(&self.mind_map.nodes);
        Some(label.to_string())
    }

    /// Adds a pending feature unless one with the same name exists
    /// (case-insensitive). Returns the new feature's id.
    pub fn add_feature(&mut self, name: &str) -> Option<String> {
        let lowered = name.to_lowercase();
        let exists = self
            .features
            .iter()
            .any(|f| f.name.to_lowercase() == lowered);
        if exists {
            return None;
        }
        let feature = Feature::pending(name);
        let id = feature.id.clone();
        self.features.push(feature);
        Some(id)
    }

    /// Changes the review status of a feature.
    pub fn set_feature_status(&mut self, feature_id: &str, status: FeatureStatus) -> Result<()> {
        let feature = self
            .features
            .iter_mut()
            .find(|f| f.id == feature_id)
            .ok_or_else(|| IdeaforgeError::feature_not_found(feature_id))?;
        feature.status = status;
        Ok(())
    }

    /// The evolution log, for appending through the tracker.
    pub fn idea_evolution_mut(&mut self) -> &mut EvolutionLog {
        &mut self.idea_evolution
    }
}
