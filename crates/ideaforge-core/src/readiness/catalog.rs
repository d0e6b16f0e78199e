use serde::{Deserialize, Serialize};

/// Artifact that must exist before an action is offered as `ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prerequisite {
    /// Target market plus at least one next step.
    CompletedStrategy,
    /// At least one approved feature.
    ApprovedFeature,
    /// Enough vision, market and product nodes.
    ValidationReady,
}

/// A navigation target the readiness gate reports on.
///
/// `id` is opaque: it is resolved to a route elsewhere and only compared for
/// equality here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageAction {
    pub id: String,
    pub prerequisite: Prerequisite,
    /// Lower-case phrases that mark the action as suggested in a reply.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl StageAction {
    pub fn new(id: impl Into<String>, prerequisite: Prerequisite, keywords: &[&str]) -> Self {
        Self {
            id: id.into(),
            prerequisite,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn mentioned_in(&self, lowered: &str) -> bool {
        lowered.contains(&self.id.to_lowercase())
            || self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

pub const BUSINESS_STRATEGY_ACTION: &str = "business-strategy";
pub const FEATURE_PLANNING_ACTION: &str = "feature-planning";
pub const VALIDATION_ACTION: &str = "validation";

/// Ordered list of known stage actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCatalog {
    actions: Vec<StageAction>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<StageAction>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[StageAction] {
        &self.actions
    }

    pub fn get(&self, id: &str) -> Option<&StageAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Returns the id of the first action suggested by `text`, matching the
    /// id or any keyword case-insensitively.
    pub fn detect_hint(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.actions
            .iter()
            .find(|action| action.mentioned_in(&lowered))
            .map(|action| action.id.as_str())
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new(vec![
            StageAction::new(
                BUSINESS_STRATEGY_ACTION,
                Prerequisite::CompletedStrategy,
                &["business strategy", "business plan", "go-to-market"],
            ),
            StageAction::new(
                FEATURE_PLANNING_ACTION,
                Prerequisite::ApprovedFeature,
                &["feature planning", "plan the features", "roadmap"],
            ),
            StageAction::new(
                VALIDATION_ACTION,
                Prerequisite::ValidationReady,
                &["validate", "validation"],
            ),
        ])
    }
}
