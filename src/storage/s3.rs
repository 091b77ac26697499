//! S3 object storage.

use super::{ObjectStore, StorageError, StorageResult};
use crate::types::{Listing, ObjectInfo};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

/// S3-backed object storage
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Build a client for `region` using the default credential chain.
    pub async fn from_region(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(Client::new(&config))
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Convert an SDK timestamp, falling back to the epoch when out of range.
fn to_chrono(value: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos()).unwrap_or_default()
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Listing> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 list failed: {}", DisplayErrorContext(&e))))?;

        let objects: Vec<ObjectInfo> = response
            .contents()
            .iter()
            .filter_map(|object| {
                let key = object.key()?;
                Some(ObjectInfo {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: object.last_modified().map(to_chrono).unwrap_or_default(),
                })
            })
            .collect();

        let truncated = response.is_truncated().unwrap_or(false);
        debug!(bucket = %bucket, prefix = %prefix, count = objects.len(), truncated, "Listed objects from S3");
        Ok(Listing { objects, truncated })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let len = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 put failed: {}", DisplayErrorContext(&e))))?;

        debug!(bucket = %bucket, key = %key, bytes = len, "Put object to S3");
        Ok(())
    }
}
