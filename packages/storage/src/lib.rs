// ABOUTME: JSON-file persistence for PromptForge
// ABOUTME: Context store and checkpoint log, one record file per identity/run

pub mod checkpoints;
pub mod context;
pub mod error;

pub use checkpoints::CheckpointLog;
pub use context::{ContextStats, ContextStore};
pub use error::{StorageError, StorageResult};

/// Top-level version written into every record file.
pub const STORAGE_VERSION: &str = "1";
