use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CheckpointError, CheckpointSink};

/// In-memory sink for tests: keeps every snapshot it was handed.
pub struct MemoryCheckpoint<T> {
    snapshots: Mutex<Vec<Vec<T>>>,
}

impl<T> Default for MemoryCheckpoint<T> {
    fn default() -> Self {
        Self {
            snapshots: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> MemoryCheckpoint<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Vec<T>> {
        self.snapshots.lock().clone()
    }

    pub fn last(&self) -> Option<Vec<T>> {
        self.snapshots.lock().last().cloned()
    }

    pub fn write_count(&self) -> usize {
        self.snapshots.lock().len()
    }
}

#[async_trait]
impl<T> CheckpointSink<T> for MemoryCheckpoint<T>
where
    T: Clone + Send + Sync,
{
    async fn save(&self, records: &[T]) -> Result<(), CheckpointError> {
        self.snapshots.lock().push(records.to_vec());
        Ok(())
    }
}
