//! Stage readiness derivation.
//!
//! Everything here is a pure function of the workspace state and the latest
//! conversation hint.

mod catalog;
mod gate;

pub use catalog::{
    ActionCatalog, BUSINESS_STRATEGY_ACTION, FEATURE_PLANNING_ACTION, Prerequisite, StageAction,
    VALIDATION_ACTION,
};
pub use gate::{
    ActionReadiness, ActionStatus, DEFAULT_VALIDATION_THRESHOLD, ReadinessReport,
    StageReadinessGate, is_ready_for_validation,
};
