use serde::{Deserialize, Serialize};

use crate::workspace::FeatureStatus;

/// Fields changed by one auto-populate merge. Unchanged fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoPopulateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_concept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Vec<String>>,
}

impl AutoPopulateData {
    pub fn is_empty(&self) -> bool {
        self.business_concept.is_none()
            && self.target_market.is_none()
            && self.key_features.is_none()
            && self.next_steps.is_none()
    }
}

/// Notifications published on the [`BroadcastBus`](super::BroadcastBus).
///
/// Serialized as `{ "type": ..., "data": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WorkspaceEvent {
    /// Facts extracted from a conversation turn were merged.
    AutoPopulate(AutoPopulateData),
    /// A feature's review status changed.
    FeatureReviewed {
        #[serde(rename = "featureId")]
        feature_id: String,
        status: FeatureStatus,
    },
}

impl WorkspaceEvent {
    /// Event type name as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AutoPopulate(_) => "auto_populate",
            Self::FeatureReviewed { .. } => "feature_reviewed",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
