use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use super::{CheckpointError, CheckpointSink};

/// Writes the full accumulated sequence as pretty-printed JSON to a fixed
/// path, overwriting any previous snapshot.
pub struct JsonFileCheckpoint {
    path: PathBuf,
}

impl JsonFileCheckpoint {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<T> CheckpointSink<T> for JsonFileCheckpoint
where
    T: Serialize + Send + Sync,
{
    async fn save(&self, records: &[T]) -> Result<(), CheckpointError> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

    fn scratch_path(name: &str) -> PathBuf {
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "pagepull-test-{}-{}-{}.json",
            std::process::id(),
            id,
            name
        ))
    }

    #[tokio::test]
    async fn save_overwrites_previous_snapshot() {
        let path = scratch_path("overwrite");
        let sink = JsonFileCheckpoint::new(&path).unwrap();

        sink.save(&["a".to_string(), "b".to_string()]).await.unwrap();
        sink.save(&["a".to_string()]).await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, vec!["a"]);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn save_is_idempotent_for_identical_input() {
        let path = scratch_path("idempotent");
        let sink = JsonFileCheckpoint::new(&path).unwrap();
        let records = vec!["x".to_string(), "y".to_string()];

        sink.save(&records).await.unwrap();
        let first = fs::read_to_string(&path).unwrap();
        sink.save(&records).await.unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = scratch_path("nested");
        let path = dir.join("deep").join("output.json");
        let sink = JsonFileCheckpoint::new(&path).unwrap();

        sink.save(&Vec::<String>::new()).await.unwrap();
        assert!(path.exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
