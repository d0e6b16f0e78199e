//! Errors shared by the workspace, storage, and configuration layers.

use thiserror::Error;

/// Failure of a workspace mutation, a storage tier, or config loading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdeaforgeError {
    /// No feature with this id exists in the workspace.
    #[error("Feature not found: '{0}'")]
    FeatureNotFound(String),

    /// A storage tier could not be read, written, or locked.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A snapshot or config file did not parse.
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: &'static str,
        message: String,
    },

    /// Platform directories could not be resolved.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Value outside its closed set, such as a node type or a snapshot key.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl IdeaforgeError {
    pub fn feature_not_found(feature_id: impl Into<String>) -> Self {
        Self::FeatureNotFound(feature_id.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FeatureNotFound(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

impl From<std::io::Error> for IdeaforgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for IdeaforgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON",
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for IdeaforgeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML",
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IdeaforgeError>;
