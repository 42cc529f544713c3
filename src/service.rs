use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::config::RuntimeConfig;
use crate::paths;
use crate::processor::{self, Rendition, Renditions};
use crate::storage::{self, DeleteOutcome, StorageBackend, StorageError};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("source bytes are not a decodable image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("upload of {size} bytes exceeds the accepted limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("failed to upload rendition(s): {}", failed_renditions(.0))]
    PartialUpload(Vec<(Rendition, StorageError)>),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("rendition worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

fn failed_renditions(failed: &[(Rendition, StorageError)]) -> String {
    failed
        .iter()
        .map(|(rendition, error)| format!("{} ({})", rendition.as_str(), error))
        .collect::<Vec<_>>()
        .join(", ")
}

impl MediaError {
    /// The renditions whose `put` failed, when the upload was partial.
    pub fn failed_renditions(&self) -> Option<Vec<Rendition>> {
        match self {
            Self::PartialUpload(failed) => {
                Some(failed.iter().map(|(rendition, _)| *rendition).collect())
            },
            _ => None,
        }
    }
}

/// The result of a fully successful upload.
///
/// The set of paths is the sole durable handle needed to delete the asset
/// later, no other metadata is tracked by this subsystem.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedMedia {
    pub urls: Renditions<String>,
    pub paths: Renditions<String>,
}

/// Orchestrates rendition processing, path generation and the configured
/// storage backend.
pub struct MediaService {
    backend: Arc<dyn StorageBackend>,
    max_upload_size: usize,
}

impl MediaService {
    pub fn new(backend: Arc<dyn StorageBackend>, max_upload_size: usize) -> Self {
        Self {
            backend,
            max_upload_size,
        }
    }

    /// Connects the configured backend and probes its namespace once.
    pub async fn connect(cfg: &RuntimeConfig) -> anyhow::Result<Self> {
        let backend = cfg.backend.connect(cfg.cache_control_secs).await?;
        storage::init_namespace(backend.as_ref()).await;

        Ok(Self::new(backend, cfg.max_upload_size))
    }

    #[inline]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Derives all renditions from the source image and stores them.
    ///
    /// The three `put` calls run concurrently, the overall latency is bound
    /// by the slowest single write. If any write fails the call fails with
    /// [`MediaError::PartialUpload`] naming the failed renditions, writes
    /// that already succeeded are left in place. Callers retry or clean up
    /// via [`MediaService::delete_media`].
    pub async fn upload_media(
        &self,
        resource_id: i64,
        owner_id: i64,
        data: Bytes,
    ) -> Result<UploadedMedia, MediaError> {
        if data.len() > self.max_upload_size {
            return Err(MediaError::TooLarge {
                size: data.len(),
                limit: self.max_upload_size,
            });
        }

        let source = data.clone();
        let renditions =
            tokio::task::spawn_blocking(move || processor::process_renditions(&source)).await??;

        let store_at = Renditions::from_fn(|rendition| {
            paths::generate(owner_id, resource_id, rendition)
        });

        let mut puts = Vec::with_capacity(Rendition::ALL.len());
        for (rendition, path) in store_at.entries() {
            let backend = self.backend.clone();
            let path = path.clone();
            let buffer = renditions.get(rendition).clone();
            puts.push(async move {
                let result = backend
                    .put(&path, buffer, mime::IMAGE_JPEG.as_ref())
                    .await;
                (rendition, result)
            });
        }

        let mut urls = Renditions::from_fn(|_| String::new());
        let mut failed = Vec::new();
        for (rendition, result) in futures::future::join_all(puts).await {
            match result {
                Ok(url) => urls.set(rendition, url),
                Err(e) => failed.push((rendition, e)),
            }
        }

        if !failed.is_empty() {
            warn!(
                resource_id = resource_id,
                owner_id = owner_id,
                failed = failed.len(),
                "upload incomplete, succeeded renditions were left in place"
            );
            return Err(MediaError::PartialUpload(failed));
        }

        debug!(
            resource_id = resource_id,
            owner_id = owner_id,
            "stored all renditions"
        );

        Ok(UploadedMedia {
            urls,
            paths: store_at,
        })
    }

    /// Deletes one asset's renditions by their stored paths.
    ///
    /// Against a backend without delete support this is an acknowledged
    /// no-op, the returned [`DeleteOutcome`] states which guarantee applies.
    pub async fn delete_media(
        &self,
        paths: &Renditions<String>,
    ) -> Result<DeleteOutcome, MediaError> {
        Ok(self.backend.delete(&paths.to_vec()).await?)
    }

    /// Deletes every stored object belonging to a resource.
    ///
    /// An empty listing is a successful no-op, not an error.
    pub async fn delete_all_media_for_resource(
        &self,
        owner_id: i64,
        resource_id: i64,
    ) -> Result<DeleteOutcome, MediaError> {
        let prefix = paths::resource_prefix(owner_id, resource_id);
        let objects = self.backend.list(&prefix).await?;

        if objects.is_empty() {
            debug!(prefix = prefix.as_str(), "no objects stored for resource");
            return Ok(DeleteOutcome::Deleted(0));
        }

        Ok(self.backend.delete(&objects).await?)
    }
}
