use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::{GenericImageView, Rgb, RgbImage};

use crate::config::RuntimeConfig;
use crate::paths;
use crate::processor::{self, Rendition};
use crate::service::{MediaError, MediaService};
use crate::storage::backends::{BackendConfigs, BlobStorageBackend, LifecycleBackend, MemoryBackend};
use crate::storage::{DeleteOutcome, StorageBackend, StorageError};

fn test_image(width: u32, height: u32) -> Bytes {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, 120])
    });

    let mut buff = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buff, image::ImageFormat::Png)
        .expect("encoding a fixture image never fails");

    Bytes::from(buff.into_inner())
}

fn decoded_dimensions(data: &[u8]) -> (u32, u32) {
    image::load_from_memory(data)
        .expect("stored rendition must decode")
        .dimensions()
}

fn memory_service() -> (Arc<MemoryBackend>, MediaService) {
    let backend = Arc::new(MemoryBackend::new());
    let service = MediaService::new(backend.clone(), 32 << 20);
    (backend, service)
}

/// A backend wrapper that fails every `put` whose path contains a marker,
/// delegating everything else to the wrapped memory store.
struct FlakyBackend {
    inner: Arc<MemoryBackend>,
    fail_marker: &'static str,
}

#[async_trait]
impl StorageBackend for FlakyBackend {
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if path.contains(self.fail_marker) {
            return Err(StorageError::Write {
                path: path.to_string(),
                reason: "injected fault".to_string(),
            });
        }

        self.inner.put(path, data, content_type).await
    }

    fn public_url(&self, path: &str) -> String {
        self.inner.public_url(path)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.list(prefix).await
    }

    fn supports_delete(&self) -> bool {
        self.inner.supports_delete()
    }

    async fn delete(&self, paths: &[String]) -> Result<DeleteOutcome, StorageError> {
        self.inner.delete(paths).await
    }

    async fn namespace_ready(&self) -> Result<bool, StorageError> {
        self.inner.namespace_ready().await
    }
}

#[test]
fn test_renditions_meet_sizing_targets() -> anyhow::Result<()> {
    let renditions = processor::process_renditions(&test_image(2000, 1400))?;

    assert_eq!(decoded_dimensions(&renditions.thumb), (300, 200));
    assert_eq!(decoded_dimensions(&renditions.medium), (800, 600));

    let (width, height) = decoded_dimensions(&renditions.large);
    assert!(width <= 1920 && height <= 1080);
    assert!(width < 2000 && height < 1400, "large must be scaled down");

    let source_ratio = 2000.0 / 1400.0;
    let large_ratio = width as f64 / height as f64;
    assert!((large_ratio - source_ratio).abs() < 0.01, "aspect ratio must be preserved");

    for (_, buffer) in renditions.entries() {
        assert!(!buffer.is_empty());
    }

    Ok(())
}

#[test]
fn test_large_rendition_never_upscales() -> anyhow::Result<()> {
    let renditions = processor::process_renditions(&test_image(100, 80))?;

    // Already inside the 1920x1080 box, passed through unscaled.
    assert_eq!(decoded_dimensions(&renditions.large), (100, 80));

    // Cover renditions always fill their box exactly, even for tiny sources.
    assert_eq!(decoded_dimensions(&renditions.thumb), (300, 200));
    assert_eq!(decoded_dimensions(&renditions.medium), (800, 600));

    Ok(())
}

#[test]
fn test_undecodable_source_is_rejected() {
    let result = processor::process_renditions(b"definitely not an image");
    assert!(result.is_err());
}

#[test]
fn test_generated_paths_are_distinct() {
    let generated: HashSet<String> = (0..100)
        .map(|_| paths::generate(7, 42, Rendition::Thumb))
        .collect();

    assert_eq!(generated.len(), 100);
}

#[test]
fn test_paths_carry_a_random_component() {
    let path = paths::generate(7, 42, Rendition::Thumb);

    assert!(path.starts_with("7/42/thumb_"));
    assert!(path.ends_with(".jpg"));

    let file_name = path.rsplit('/').next().unwrap();
    let segments: Vec<&str> = file_name.split('_').collect();
    assert_eq!(segments.len(), 3);

    let file_id = segments[1];
    assert_eq!(file_id.len(), paths::FILE_ID_LEN);
    assert!(file_id.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two paths for identical inputs must still differ, the ids alone are
    // not enough to reconstruct a path.
    assert_ne!(path, paths::generate(7, 42, Rendition::Thumb));
}

#[tokio::test]
async fn test_upload_stores_three_objects() -> anyhow::Result<()> {
    let (backend, service) = memory_service();

    let uploaded = service.upload_media(42, 7, test_image(1600, 1200)).await?;

    assert_eq!(backend.len().await, 3);
    for (rendition, path) in uploaded.paths.entries() {
        let stored = backend.object(path).await.expect("object must exist");
        assert!(!stored.is_empty());
        assert_eq!(uploaded.urls.get(rendition), &backend.public_url(path));
    }

    Ok(())
}

#[tokio::test]
async fn test_stored_bytes_round_trip() -> anyhow::Result<()> {
    let backend = MemoryBackend::new();
    let data = Bytes::from_static(b"jpeg bytes");

    let url = backend.put("7/42/thumb_abc_1.jpg", data.clone(), "image/jpeg").await?;

    assert_eq!(url, backend.public_url("7/42/thumb_abc_1.jpg"));
    assert_eq!(backend.object("7/42/thumb_abc_1.jpg").await, Some(data));

    Ok(())
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let backend = Arc::new(MemoryBackend::new());
    let service = MediaService::new(backend.clone(), 1024);

    let result = service.upload_media(42, 7, test_image(1600, 1200)).await;

    assert!(matches!(result, Err(MediaError::TooLarge { .. })));
    assert!(backend.is_empty().await);
}

#[tokio::test]
async fn test_partial_failure_names_the_failed_rendition() -> anyhow::Result<()> {
    let inner = Arc::new(MemoryBackend::new());
    let flaky = Arc::new(FlakyBackend {
        inner: inner.clone(),
        fail_marker: "medium_",
    });
    let service = MediaService::new(flaky, 32 << 20);

    let error = service
        .upload_media(42, 7, test_image(1600, 1200))
        .await
        .expect_err("the medium put must fail");

    assert_eq!(error.failed_renditions(), Some(vec![Rendition::Medium]));

    // No rollback: the two successful renditions remain in the store.
    assert_eq!(inner.len().await, 2);
    for path in inner.list("7/42/").await? {
        assert!(!path.contains("medium_"));
    }

    Ok(())
}

#[tokio::test]
async fn test_delete_media_removes_all_renditions() -> anyhow::Result<()> {
    let (backend, service) = memory_service();

    let uploaded = service.upload_media(42, 7, test_image(1600, 1200)).await?;
    let outcome = service.delete_media(&uploaded.paths).await?;

    assert_eq!(outcome, DeleteOutcome::Deleted(3));
    assert!(backend.is_empty().await);

    Ok(())
}

#[tokio::test]
async fn test_purging_an_empty_resource_is_a_noop() -> anyhow::Result<()> {
    let (_, service) = memory_service();

    let outcome = service.delete_all_media_for_resource(7, 42).await?;
    assert_eq!(outcome, DeleteOutcome::Deleted(0));

    Ok(())
}

#[tokio::test]
async fn test_purging_a_resource_leaves_others_untouched() -> anyhow::Result<()> {
    let (backend, service) = memory_service();

    service.upload_media(42, 7, test_image(1600, 1200)).await?;
    let other = service.upload_media(43, 7, test_image(1600, 1200)).await?;

    let outcome = service.delete_all_media_for_resource(7, 42).await?;
    assert_eq!(outcome, DeleteOutcome::Deleted(3));

    assert_eq!(backend.len().await, 3);
    for (_, path) in other.paths.entries() {
        assert!(backend.object(path).await.is_some());
    }

    Ok(())
}

#[test]
fn test_blob_public_urls_are_deterministic() -> anyhow::Result<()> {
    let backend = BlobStorageBackend::new(
        "photos".to_string(),
        "local".to_string(),
        "http://127.0.0.1:9000".to_string(),
        "access",
        "secret",
        None,
        60,
    )?;
    assert_eq!(
        backend.public_url("7/42/thumb_abc_1.jpg"),
        "http://127.0.0.1:9000/photos/7/42/thumb_abc_1.jpg",
    );

    let backend = BlobStorageBackend::new(
        "photos".to_string(),
        "local".to_string(),
        "http://127.0.0.1:9000".to_string(),
        "access",
        "secret",
        Some("https://cdn.example.com/".to_string()),
        60,
    )?;
    assert_eq!(
        backend.public_url("7/42/thumb_abc_1.jpg"),
        "https://cdn.example.com/7/42/thumb_abc_1.jpg",
    );

    Ok(())
}

#[test]
fn test_config_parses_backend_variants() -> anyhow::Result<()> {
    let raw = r#"
backend:
  blob:
    bucket: photos
    region: local
    endpoint: http://127.0.0.1:9000
    access_key: access
    secret_key: secret
"#;
    let cfg: RuntimeConfig = serde_yaml::from_str(raw)?;

    assert!(matches!(cfg.backend, BackendConfigs::Blob { .. }));
    assert_eq!(cfg.cache_control_secs, 31_536_000);
    assert_eq!(cfg.max_upload_size, 32 << 20);

    let raw = r#"
backend:
  lifecycle:
    bucket: photos
    region: local
    endpoint: http://127.0.0.1:9000
    access_key: access
    secret_key: secret
    public_url: https://cdn.example.com
cache_control_secs: 600
"#;
    let cfg: RuntimeConfig = serde_yaml::from_str(raw)?;

    match cfg.backend {
        BackendConfigs::Lifecycle { collection, .. } => assert_eq!(collection, "media"),
        other => panic!("expected a lifecycle backend, got {:?}", other),
    }
    assert_eq!(cfg.cache_control_secs, 600);

    Ok(())
}

#[tokio::test]
async fn test_lifecycle_backend_accepts_deletes_without_removal() -> anyhow::Result<()> {
    let backend = LifecycleBackend::new(
        "photos".to_string(),
        "local".to_string(),
        "http://127.0.0.1:9000".to_string(),
        "access",
        "secret",
        "https://cdn.example.com".to_string(),
        "listing-photos".to_string(),
        31_536_000,
    )?;

    assert!(!backend.supports_delete());

    // No network call is made, the request is only acknowledged.
    let outcome = backend
        .delete(&["7/42/thumb_abc_1.jpg".to_string()])
        .await?;
    assert_eq!(outcome, DeleteOutcome::Accepted);

    assert_eq!(
        backend.public_url("7/42/thumb_abc_1.jpg"),
        "https://cdn.example.com/listing-photos/7/42/thumb_abc_1.jpg",
    );

    Ok(())
}
