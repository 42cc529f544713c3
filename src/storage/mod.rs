pub mod backends;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("write to {path:?} failed: {reason}")]
    Write { path: String, reason: String },

    #[error("listing objects under {prefix:?} failed: {reason}")]
    List { prefix: String, reason: String },

    #[error("deleting {count} object(s) failed: {reason}")]
    Delete { count: usize, reason: String },
}

/// What a backend guarantees after a successful `delete` call.
///
/// `Accepted` is a weaker promise than `Deleted`: the request was
/// acknowledged but the bytes are reclaimed later by provider-side lifecycle
/// rules, callers must never assume immediate space reclamation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "outcome", content = "removed")]
pub enum DeleteOutcome {
    /// The provider removed the objects synchronously.
    Deleted(usize),

    /// The request was acknowledged, reclamation is deferred to the
    /// provider's lifecycle rules.
    Accepted,
}

impl std::fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deleted(count) => write!(f, "deleted {} object(s)", count),
            Self::Accepted => write!(f, "accepted, reclamation deferred to lifecycle rules"),
        }
    }
}

/// The capability set every object-storage backend must provide.
///
/// Backends are interchangeable behind this trait, callers never branch on
/// which concrete provider is configured. The one divergence providers are
/// allowed is synchronous deletion: a backend that relies on lifecycle rules
/// reports `supports_delete() == false` and acknowledges delete requests
/// without touching the network.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Stores an object, overwriting any previous content at the same path.
    ///
    /// Returns the public URL the object is reachable at.
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Derives the public URL for a path without touching the network.
    fn public_url(&self, path: &str) -> String;

    /// Enumerates the object paths stored under the given prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Whether this backend can remove objects on demand.
    fn supports_delete(&self) -> bool;

    /// Removes a set of objects.
    ///
    /// Backends without on-demand deletion log the request and return
    /// [`DeleteOutcome::Accepted`], they never error on the missing
    /// capability.
    async fn delete(&self, paths: &[String]) -> Result<DeleteOutcome, StorageError>;

    /// Whether the expected namespace/bucket exists and is reachable.
    async fn namespace_ready(&self) -> Result<bool, StorageError>;
}

/// One-time startup probe of the configured storage namespace.
///
/// Provisioning is an out-of-band operational step which may require
/// privileges this process does not hold, so a missing or unverifiable
/// namespace is only warned about, never a hard failure.
pub async fn init_namespace(backend: &dyn StorageBackend) {
    match backend.namespace_ready().await {
        Ok(true) => info!("storage namespace is ready"),
        Ok(false) => warn!(
            "storage namespace is missing, uploads will fail until it is \
             provisioned with public access enabled"
        ),
        Err(e) => warn!(error = %e, "unable to verify the storage namespace"),
    }
}
