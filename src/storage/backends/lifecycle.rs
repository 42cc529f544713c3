use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use crate::storage::{DeleteOutcome, StorageBackend, StorageError};

/// A managed blob store that exposes no delete API.
///
/// Objects are written and listed through the provider's S3-compatible
/// surface but removal is handled entirely by provider-side lifecycle rules,
/// a delete request is acknowledged and otherwise ignored.
///
/// All keys are nested under a fixed collection name. The prefix is applied
/// symmetrically in `put`, `list` and `public_url` so callers only ever see
/// the canonical un-prefixed paths.
pub struct LifecycleBackend {
    bucket: Bucket,
    collection: String,
    public_url: String,
}

impl LifecycleBackend {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        region: String,
        endpoint: String,
        access_key: &str,
        secret_key: &str,
        public_url: String,
        collection: String,
        cache_control_secs: u32,
    ) -> Result<Self> {
        let creds = Credentials::new(Some(access_key), Some(secret_key), None, None, None)?;
        let region = Region::Custom { region, endpoint };
        let mut bucket = Bucket::new(&name, region, creds)?.with_path_style();
        bucket.add_header(
            "cache-control",
            &format!("public, max-age={}", cache_control_secs),
        );

        Ok(Self {
            bucket,
            collection,
            public_url,
        })
    }

    #[inline]
    fn object_key(&self, path: &str) -> String {
        format!("{}/{}", self.collection, path)
    }
}

#[async_trait]
impl StorageBackend for LifecycleBackend {
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let store_in = self.object_key(path);

        debug!(path = store_in.as_str(), "storing object in managed store");
        let response = self
            .bucket
            .put_object_with_content_type(&store_in, &data, content_type)
            .await
            .map_err(|e| StorageError::Write {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status_code();
        if status != 200 {
            return Err(StorageError::Write {
                path: path.to_string(),
                reason: format!("managed store returned status {}", status),
            });
        }

        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.public_url.trim_end_matches('/'),
            self.object_key(path),
        )
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let rooted = self.object_key(prefix);

        debug!(prefix = rooted.as_str(), "listing objects in managed store");
        let pages = self
            .bucket
            .list(rooted, None)
            .await
            .map_err(|e| StorageError::List {
                prefix: prefix.to_string(),
                reason: e.to_string(),
            })?;

        let collection_root = format!("{}/", self.collection);
        let names = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| {
                object
                    .key
                    .strip_prefix(&collection_root)
                    .map(String::from)
                    .unwrap_or(object.key)
            })
            .collect();

        Ok(names)
    }

    fn supports_delete(&self) -> bool {
        false
    }

    async fn delete(&self, paths: &[String]) -> Result<DeleteOutcome, StorageError> {
        info!(
            count = paths.len(),
            "delete requested, objects are reclaimed by provider lifecycle rules"
        );
        Ok(DeleteOutcome::Accepted)
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
