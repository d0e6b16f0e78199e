//! Storage tier implementations.
//!
//! - `memory_tier`: ephemeral session tier
//! - `file_tier`: durable local tier on top of `atomic_file`

pub mod atomic_file;
pub mod file_tier;
pub mod memory_tier;

pub use atomic_file::{AtomicFile, AtomicFileError};
pub use file_tier::FileTier;
pub use memory_tier::MemoryTier;
