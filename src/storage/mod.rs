//! Object storage abstraction.
//!
//! The generator needs two operations from a bucket: list keys under a prefix,
//! and write one object. [`ObjectStore`] captures exactly that so the same
//! generator runs against S3 in production, a directory on disk for local
//! runs, and an in-memory map in tests.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`S3Store`] | Deployed function, `aws-sdk-s3` |
//! | [`LocalStore`] | `gallery-manifest run --local-root DIR` |
//! | [`MemoryStore`] | Unit and integration tests, failure injection |

pub mod local;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

use crate::types::Listing;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A bucket-addressed object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List objects whose key starts with `prefix`, in one request.
    ///
    /// Backends that page their results return only the first page and set
    /// [`Listing::truncated`].
    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Listing>;

    /// Write `body` to `key`, replacing any existing object.
    ///
    /// A failed write must leave the previous object untouched.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> StorageResult<()>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Listing> {
        (**self).list(bucket, prefix).await
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        (**self).put(bucket, key, body, content_type).await
    }
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Box<S> {
    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Listing> {
        (**self).list(bucket, prefix).await
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        (**self).put(bucket, key, body, content_type).await
    }
}
