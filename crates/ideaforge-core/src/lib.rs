//! Domain layer for IdeaForge.
//!
//! Holds the canonical workspace model and the I/O-free pieces of the
//! synchronization subsystem: the evolution log, the stage readiness gate,
//! the broadcast bus, and the traits behind which extraction and
//! persistence live.

pub mod broadcast;
pub mod config;
pub mod conversation;
pub mod error;
pub mod evolution;
pub mod extraction;
pub mod persistence;
pub mod readiness;
pub mod workspace;

// Re-export common error type
pub use error::IdeaforgeError;
