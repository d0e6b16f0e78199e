//! Application layer for IdeaForge.
//!
//! Coordinates the domain types and the infrastructure tiers into the
//! conversation turn: extract, merge, persist, publish.

pub mod conversation_pipeline;
pub mod merge;
pub mod workspace_store;

pub use conversation_pipeline::{
    ConversationPipeline, FALLBACK_MESSAGE, PERSISTENCE_FAILURE_MESSAGE, PipelineError,
    PipelineState, TurnOutcome,
};
pub use merge::merge_extraction;
pub use workspace_store::WorkspaceStore;
