//! In-memory object storage.
//!
//! Keys are held in a `BTreeMap`, so listings come back in lexicographic key
//! order the way S3 returns them. Failures can be injected per operation to
//! exercise the generator's error path, and a page limit simulates a listing
//! that the backend truncated.

use super::{ObjectStore, StorageError, StorageResult};
use crate::types::{Listing, ObjectInfo};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// A stored object with the metadata a listing reports.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
    /// Reported size. Equal to `body.len()` unless seeded with [`MemoryStore::insert_sized`].
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<(String, String), StoredObject>,
    list_failure: Option<String>,
    put_failure: Option<String>,
    page_limit: Option<usize>,
    puts: usize,
}

/// Mock bucket store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object with a body.
    pub fn insert(
        &self,
        bucket: &str,
        key: &str,
        body: impl Into<Bytes>,
        last_modified: DateTime<Utc>,
    ) {
        let body = body.into();
        let size = body.len() as u64;
        self.state.write().objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: "application/octet-stream".to_string(),
                size,
                last_modified,
            },
        );
    }

    /// Seed an object that reports `size` without holding that many bytes.
    pub fn insert_sized(&self, bucket: &str, key: &str, size: u64, last_modified: DateTime<Utc>) {
        self.state.write().objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: Bytes::new(),
                content_type: "application/octet-stream".to_string(),
                size,
                last_modified,
            },
        );
    }

    pub fn get(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        self.state
            .read()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    /// Make every subsequent `list` fail with `message`.
    pub fn fail_lists(&self, message: impl Into<String>) {
        self.state.write().list_failure = Some(message.into());
    }

    /// Make every subsequent `put` fail with `message`.
    pub fn fail_puts(&self, message: impl Into<String>) {
        self.state.write().put_failure = Some(message.into());
    }

    /// Return at most `limit` objects per listing and flag the rest as truncated.
    pub fn set_page_limit(&self, limit: usize) {
        self.state.write().page_limit = Some(limit);
    }

    /// Number of successful writes so far.
    pub fn put_count(&self) -> usize {
        self.state.read().puts
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Listing> {
        let state = self.state.read();
        if let Some(message) = &state.list_failure {
            return Err(StorageError::Backend(message.clone()));
        }

        let mut objects: Vec<ObjectInfo> = state
            .objects
            .iter()
            .filter(|((b, key), _)| b == bucket && key.starts_with(prefix))
            .map(|((_, key), object)| ObjectInfo {
                key: key.clone(),
                size: object.size,
                last_modified: object.last_modified,
            })
            .collect();

        let truncated = match state.page_limit {
            Some(limit) if objects.len() > limit => {
                objects.truncate(limit);
                true
            }
            _ => false,
        };

        Ok(Listing { objects, truncated })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let mut state = self.state.write();
        if let Some(message) = &state.put_failure {
            return Err(StorageError::Backend(message.clone()));
        }

        let size = body.len() as u64;
        state.objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                size,
                last_modified: Utc::now(),
            },
        );
        state.puts += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn lists_by_bucket_and_prefix_in_key_order() {
        let store = MemoryStore::new();
        store.insert("b", "gallery/z.jpg", "zz", t());
        store.insert("b", "gallery/a.jpg", "a", t());
        store.insert("b", "other/x.jpg", "x", t());
        store.insert("other-bucket", "gallery/y.jpg", "y", t());

        let listing = store.list("b", "gallery/").await.unwrap();
        let keys: Vec<&str> = listing.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["gallery/a.jpg", "gallery/z.jpg"]);
        assert_eq!(listing.objects[1].size, 2);
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = MemoryStore::new();
        store
            .put("b", "k", Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();
        let object = store.get("b", "k").unwrap();
        assert_eq!(&object.body[..], b"{}");
        assert_eq!(object.content_type, "application/json");
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("b", "missing"),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn injected_put_failure_keeps_previous_object() {
        let store = MemoryStore::new();
        store.insert("b", "k", "old", t());
        store.fail_puts("access denied");

        let err = store
            .put("b", "k", Bytes::from_static(b"new"), "text/plain")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "access denied");
        assert_eq!(&store.get("b", "k").unwrap().body[..], b"old");
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn injected_list_failure() {
        let store = MemoryStore::new();
        store.fail_lists("network unreachable");
        let err = store.list("b", "").await.unwrap_err();
        assert_eq!(err.to_string(), "network unreachable");
    }

    #[tokio::test]
    async fn page_limit_truncates() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert_sized("b", &format!("g/{i}.jpg"), 1, t());
        }
        store.set_page_limit(3);

        let listing = store.list("b", "g/").await.unwrap();
        assert_eq!(listing.objects.len(), 3);
        assert!(listing.truncated);
    }
}
