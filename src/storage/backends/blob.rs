use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use crate::storage::{DeleteOutcome, StorageBackend, StorageError};

/// A S3-compatible blob store with full delete support.
pub struct BlobStorageBackend {
    bucket: Bucket,
    public_url: String,
}

impl BlobStorageBackend {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        region: String,
        endpoint: String,
        access_key: &str,
        secret_key: &str,
        public_url: Option<String>,
        cache_control_secs: u32,
    ) -> Result<Self> {
        let creds = Credentials::new(Some(access_key), Some(secret_key), None, None, None)?;
        let region = Region::Custom {
            region,
            endpoint: endpoint.clone(),
        };
        let mut bucket = Bucket::new(&name, region, creds)?.with_path_style();
        bucket.add_header(
            "cache-control",
            &format!("public, max-age={}", cache_control_secs),
        );

        let public_url = public_url
            .unwrap_or_else(|| format!("{}/{}", endpoint.trim_end_matches('/'), name));

        Ok(Self { bucket, public_url })
    }
}

#[async_trait]
impl StorageBackend for BlobStorageBackend {
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        debug!(path = path, "storing object in bucket");
        let response = self
            .bucket
            .put_object_with_content_type(path, &data, content_type)
            .await
            .map_err(|e| StorageError::Write {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status_code();
        if status != 200 {
            return Err(StorageError::Write {
                path: path.to_string(),
                reason: format!("remote storage bucket returned status {}", status),
            });
        }

        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), path)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        debug!(prefix = prefix, "listing objects in bucket");
        let pages = self
            .bucket
            .list(prefix.to_string(), None)
            .await
            .map_err(|e| StorageError::List {
                prefix: prefix.to_string(),
                reason: e.to_string(),
            })?;

        let names = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| object.key)
            .collect();

        Ok(names)
    }

    fn supports_delete(&self) -> bool {
        true
    }

    async fn delete(&self, paths: &[String]) -> Result<DeleteOutcome, StorageError> {
        for path in paths {
            debug!(path = path.as_str(), "purging object in bucket");
            let response =
                self.bucket
                    .delete_object(path)
                    .await
                    .map_err(|e| StorageError::Delete {
                        count: paths.len(),
                        reason: e.to_string(),
                    })?;

            let status = response.status_code();
            if status != 200 && status != 204 && status != 404 {
                return Err(StorageError::Delete {
                    count: paths.len(),
                    reason: format!(
                        "remote storage bucket returned status {} for {:?}",
                        status, path,
                    ),
                });
            }
        }

        Ok(DeleteOutcome::Deleted(paths.len()))
    }

    async fn namespace_ready(&self) -> Result<bool, StorageError> {
        match self.bucket.list(String::new(), Some("/".to_string())).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let reason = e.to_string();
                if reason.contains("404") || reason.contains("NoSuchBucket") {
                    Ok(false)
                } else {
                    Err(StorageError::List {
                        prefix: String::new(),
                        reason,
                    })
                }
            },
        }
    }
}
