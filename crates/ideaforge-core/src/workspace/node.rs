//! Mind map node types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::error::{IdeaforgeError, Result};

/// Classification of a fact extracted from the conversation.
///
/// This is a closed set. Parsing or deserializing any other name fails.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeType {
    /// The overall business vision.
    Vision,
    /// A target market or customer segment.
    Market,
    /// A product capability.
    Product,
    /// A described user persona.
    Persona,
    /// A loose idea or next step.
    Idea,
}

impl NodeType {
    /// Parses a node type name, rejecting anything outside the closed set.
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name)
            .map_err(|_| IdeaforgeError::invalid_value(format!("unknown node type '{}'", name)))
    }

    /// Whether this type counts towards validation readiness.
    pub fn is_validation_relevant(self) -> bool {
        matches!(self, Self::Vision | Self::Market | Self::Product)
    }
}

/// A typed fact on the mind map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
}

impl Node {
    /// Creates a node with a fresh id.
    pub fn new(node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node_type,
            label: label.into(),
        }
    }
}
