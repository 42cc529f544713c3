//! Media ingestion and storage abstraction layer.
//!
//! Takes a raw uploaded image, derives a fixed set of renditions from it and
//! persists them through one of several interchangeable object-storage
//! backends, returning stable public URLs along with the storage paths needed
//! to reclaim the objects later.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod paths;
pub mod processor;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use crate::processor::{Rendition, Renditions};
pub use crate::service::{MediaError, MediaService, UploadedMedia};
pub use crate::storage::{DeleteOutcome, StorageBackend, StorageError};
