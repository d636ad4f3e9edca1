//! Q-table persistence: versioned checkpoint directories with a `latest`
//! pointer and pruning of old snapshots.

mod manager;
mod metadata;

pub use manager::{CheckpointData, CheckpointManager, CheckpointManagerConfig};
pub use metadata::{CheckpointMetadata, CheckpointMetrics};
