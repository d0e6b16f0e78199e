//! Workspace domain module.
//!
//! - `node`: mind map node types (`Node`, `NodeType`)
//! - `model`: the canonical `WorkspaceState` and its parts

mod model;
mod node;

pub use model::{
    CORE_FEATURE_CATEGORY, ClarificationData, Feature, FeatureStatus, MindMap, SessionSummary,
    WorkspaceState,
};
pub use node::{Node, NodeType};
