mod blob;
mod lifecycle;
mod memory;

use std::sync::Arc;

use serde::Deserialize;

pub use blob::BlobStorageBackend;
pub use lifecycle::LifecycleBackend;
pub use memory::MemoryBackend;

use crate::storage::StorageBackend;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendConfigs {
    /// A S3-compatible blob store with full delete support.
    Blob {
        bucket: String,
        region: String,
        endpoint: String,
        access_key: String,
        secret_key: String,

        /// Overrides the base the public URLs are derived from.
        ///
        /// Defaults to `{endpoint}/{bucket}`.
        public_url: Option<String>,
    },

    /// A managed blob store without a delete API, storage is reclaimed by
    /// provider-side lifecycle rules.
    Lifecycle {
        bucket: String,
        region: String,
        endpoint: String,
        access_key: String,
        secret_key: String,
        public_url: String,

        #[serde(default = "default_collection")]
        /// The fixed collection name object keys are nested under.
        collection: String,
    },

    /// An in-process store for tests and local development.
    Memory,
}

impl BackendConfigs {
    pub async fn connect(&self, cache_control_secs: u32) -> anyhow::Result<Arc<dyn StorageBackend>> {
        match self {
            Self::Blob {
                bucket,
                region,
                endpoint,
                access_key,
                secret_key,
                public_url,
            } => {
                let backend = BlobStorageBackend::new(
                    bucket.clone(),
                    region.clone(),
                    endpoint.clone(),
                    access_key,
                    secret_key,
                    public_url.clone(),
                    cache_control_secs,
                )?;
                Ok(Arc::new(backend))
            },
            Self::Lifecycle {
                bucket,
                region,
                endpoint,
                access_key,
                secret_key,
                public_url,
                collection,
            } => {
                let backend = LifecycleBackend::new(
                    bucket.clone(),
                    region.clone(),
                    endpoint.clone(),
                    access_key,
                    secret_key,
                    public_url.clone(),
                    collection.clone(),
                    cache_control_secs,
                )?;
                Ok(Arc::new(backend))
            },
            Self::Memory => Ok(Arc::new(MemoryBackend::new())),
        }
    }
}

fn default_collection() -> String {
    "media".to_string()
}
