//! Application configuration model (`config.toml`).
//!
//! Every field has a default so a missing or partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::evolution::DEFAULT_TRIGGER_MAX_CHARS;
use crate::persistence::DEFAULT_SNAPSHOT_KEY;
use crate::readiness::DEFAULT_VALIDATION_THRESHOLD;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_CONTEXT: &str = "dream";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RootConfig {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

/// Settings for the extraction service client.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractionConfig {
    pub model: String,
    /// Falls back to the `GEMINI_API_KEY` environment variable when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_EXTRACTION_TIMEOUT_SECS,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            system_instruction: None,
        }
    }
}

/// Settings for the workspace pipeline and its storage.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub snapshot_key: String,
    pub trigger_max_chars: usize,
    pub validation_threshold: usize,
    pub page_context: String,
    /// Overrides the local tier directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            trigger_max_chars: DEFAULT_TRIGGER_MAX_CHARS,
            validation_threshold: DEFAULT_VALIDATION_THRESHOLD,
            page_context: DEFAULT_PAGE_CONTEXT.to_string(),
            data_dir: None,
        }
    }
}
