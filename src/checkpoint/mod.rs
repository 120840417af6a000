mod disk;
mod memory;

pub use disk::JsonFileCheckpoint;
pub use memory::MemoryCheckpoint;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable snapshot of the accumulated records, full-overwrite semantics:
/// each save replaces whatever the previous one wrote. Best-effort from the
/// extractor's side; a failed save is logged and never aborts the run.
#[async_trait]
pub trait CheckpointSink<T>: Send + Sync {
    async fn save(&self, records: &[T]) -> Result<(), CheckpointError>;
}
