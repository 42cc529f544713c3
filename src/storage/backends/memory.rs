use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;
use tokio::sync::Mutex;

use crate::storage::{DeleteOutcome, StorageBackend, StorageError};

/// An in-process store used by tests and local development.
///
/// Implements the full capability set, URLs use the `memory://` scheme.
#[derive(Default)]
pub struct MemoryBackend {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored bytes for a path, if any.
    pub async fn object(&self, path: &str) -> Option<Bytes> {
        self.objects.lock().await.get(path).cloned()
    }

    /// The number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        debug!(path = path, "storing object in memory");
        self.objects.lock().await.insert(path.to_string(), data);
        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}", path)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.lock().await;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn supports_delete(&self) -> bool {
        true
    }

    async fn delete(&self, paths: &[String]) -> Result<DeleteOutcome, StorageError> {
        let mut objects = self.objects.lock().await;
        let mut removed = 0;
        for path in paths {
            if objects.remove(path).is_some() {
                removed += 1;
            }
        }

        Ok(DeleteOutcome::Deleted(removed))
    }

    async fn namespace_ready(&self) -> Result<bool, StorageError> {
        Ok(true)
    }
}
