//! Idea evolution history.
//!
//! - `log`: the append-only `EvolutionLog` and its immutable `EvolutionEntry`
//! - `tracker`: `EvolutionTracker`, which decides when a change is recorded

mod log;
mod tracker;

pub use log::{EvolutionEntry, EvolutionLog};
pub use tracker::{DEFAULT_TRIGGER_MAX_CHARS, EvolutionTracker};
