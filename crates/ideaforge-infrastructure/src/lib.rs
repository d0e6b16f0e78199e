pub mod config_service;
pub mod paths;
pub mod snapshot_store;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::IdeaforgePaths;
pub use crate::snapshot_store::TieredSnapshotStore;
pub use crate::storage::{FileTier, MemoryTier};
