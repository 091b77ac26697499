//! Directory-backed object storage for local runs.
//!
//! ```text
//! <root>/
//! └── my-photos/                 # bucket
//!     └── gallery/               # part of the key, not a real prefix boundary
//!         ├── a.jpg              # key "gallery/a.jpg"
//!         └── manifest.json      # key "gallery/manifest.json"
//! ```
//!
//! Keys are paths relative to the bucket directory with `/` separators. Listing
//! walks the whole bucket and filters by string prefix, matching object-store
//! semantics where `gallery` also matches `gallery-old/x.jpg`.

use super::{ObjectStore, StorageError, StorageResult};
use crate::types::{Listing, ObjectInfo};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Suffix for in-flight writes. Files carrying it are never listed.
const PARTIAL_SUFFIX: &str = ".partial";

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// A bucket is a single directory name directly under the root.
    fn bucket_dir(&self, bucket: &str) -> StorageResult<PathBuf> {
        if !is_plain_relative(bucket) || bucket.contains('/') {
            return Err(StorageError::Backend(format!("invalid bucket name: {bucket:?}")));
        }
        Ok(self.root.join(bucket))
    }

    /// Resolve a key to a path that stays inside the bucket directory.
    ///
    /// Keys must be relative, `/`-separated, with no empty, `.` or `..`
    /// segments. A leading `/` is a legal S3 key but would make `join`
    /// discard the bucket directory, so it is refused here.
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        let bucket_dir = self.bucket_dir(bucket)?;
        if !is_plain_relative(key) {
            return Err(StorageError::Backend(format!("invalid object key: {key:?}")));
        }
        let path = bucket_dir.join(key);
        if !path.starts_with(&bucket_dir) {
            return Err(StorageError::Backend(format!("invalid object key: {key:?}")));
        }
        Ok(path)
    }

    fn key_for(bucket_dir: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(bucket_dir).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    fn list_blocking(&self, bucket: &str, prefix: &str) -> StorageResult<Listing> {
        let bucket_dir = self.bucket_dir(bucket)?;
        if !bucket_dir.is_dir() {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: prefix.to_string(),
            });
        }

        let mut objects = Vec::new();
        for entry in WalkDir::new(&bucket_dir).follow_links(true) {
            let entry = entry.map_err(|e| StorageError::Backend(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(key) = Self::key_for(&bucket_dir, entry.path()) else {
                continue;
            };
            if key.ends_with(PARTIAL_SUFFIX) || !key.starts_with(prefix) {
                continue;
            }
            let metadata = entry.metadata().map_err(|e| StorageError::Backend(e.to_string()))?;
            let last_modified: DateTime<Utc> = metadata.modified()?.into();
            objects.push(ObjectInfo {
                key,
                size: metadata.len(),
                last_modified,
            });
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(Listing {
            objects,
            truncated: false,
        })
    }

    /// Write to a sibling temp file, then rename over the target.
    fn put_blocking(&self, bucket: &str, key: &str, body: &[u8]) -> StorageResult<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut partial = path.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);

        let result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&partial)?;
            file.write_all(body)?;
            file.sync_all()?;
            fs::rename(&partial, &path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Non-empty, `/`-separated, every segment a normal path component.
fn is_plain_relative(value: &str) -> bool {
    !value.is_empty()
        && value.split('/').all(|segment| {
            let mut components = Path::new(segment).components();
            matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
        })
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Listing> {
        let listing = self.list_blocking(bucket, prefix)?;
        debug!(root = %self.root.display(), bucket = %bucket, prefix = %prefix, count = listing.objects.len(), "Listed local objects");
        Ok(listing)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.put_blocking(bucket, key, &body)?;
        debug!(root = %self.root.display(), bucket = %bucket, key = %key, bytes = body.len(), "Wrote local object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalStore) {
        let tmp = TempDir::new().unwrap();
        let bucket = tmp.path().join("photos");
        fs::create_dir_all(bucket.join("gallery/2024")).unwrap();
        fs::create_dir_all(bucket.join("gallery-old")).unwrap();
        fs::write(bucket.join("gallery/b.jpg"), b"bb").unwrap();
        fs::write(bucket.join("gallery/a.jpg"), b"a").unwrap();
        fs::write(bucket.join("gallery/2024/c.png"), b"ccc").unwrap();
        fs::write(bucket.join("gallery-old/d.jpg"), b"d").unwrap();
        fs::write(bucket.join("root.txt"), b"r").unwrap();
        let store = LocalStore::new(tmp.path());
        (tmp, store)
    }

    fn keys(listing: &Listing) -> Vec<&str> {
        listing.objects.iter().map(|o| o.key.as_str()).collect()
    }

    #[tokio::test]
    async fn lists_nested_keys_sorted() {
        let (_tmp, store) = setup();
        let listing = store.list("photos", "gallery/").await.unwrap();
        assert_eq!(
            keys(&listing),
            vec!["gallery/2024/c.png", "gallery/a.jpg", "gallery/b.jpg"]
        );
        assert_eq!(listing.objects[0].size, 3);
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn prefix_is_a_string_match() {
        let (_tmp, store) = setup();
        let listing = store.list("photos", "gallery").await.unwrap();
        assert!(keys(&listing).contains(&"gallery-old/d.jpg"));
    }

    #[tokio::test]
    async fn empty_prefix_lists_everything() {
        let (_tmp, store) = setup();
        let listing = store.list("photos", "").await.unwrap();
        assert_eq!(listing.objects.len(), 5);
    }

    #[tokio::test]
    async fn missing_bucket_is_an_error() {
        let (_tmp, store) = setup();
        let err = store.list("nope", "").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn put_creates_parents_and_replaces() {
        let (tmp, store) = setup();
        store
            .put("photos", "gallery/new/manifest.json", Bytes::from_static(b"1"), "application/json")
            .await
            .unwrap();
        store
            .put("photos", "gallery/new/manifest.json", Bytes::from_static(b"22"), "application/json")
            .await
            .unwrap();

        let written = fs::read(tmp.path().join("photos/gallery/new/manifest.json")).unwrap();
        assert_eq!(written, b"22");
        assert!(!tmp.path().join("photos/gallery/new/manifest.json.partial").exists());
    }

    #[tokio::test]
    async fn partial_files_are_not_listed() {
        let (tmp, store) = setup();
        fs::write(tmp.path().join("photos/gallery/x.jpg.partial"), b"x").unwrap();
        let listing = store.list("photos", "gallery/").await.unwrap();
        assert!(!keys(&listing).iter().any(|k| k.ends_with(".partial")));
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let (_tmp, store) = setup();
        for key in ["../escape.json", "gallery/../../escape.json", "gallery//x.json", "./x.json", ""] {
            let err = store
                .put("photos", key, Bytes::from_static(b"x"), "application/json")
                .await
                .unwrap_err();
            assert!(err.to_string().contains("invalid object key"), "{key:?}: {err}");
        }
    }

    #[tokio::test]
    async fn rejects_absolute_keys() {
        let (_tmp, store) = setup();
        let outside = TempDir::new().unwrap();
        let key = format!("{}/manifest.json", outside.path().display());
        assert!(key.starts_with('/'));

        let err = store
            .put("photos", &key, Bytes::from_static(b"x"), "application/json")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid object key"));
        assert!(!outside.path().join("manifest.json").exists());
    }

    #[tokio::test]
    async fn rejects_leading_slash_prefix_manifest_key() {
        let (tmp, store) = setup();
        let result = store
            .put("photos", "/gallery/manifest.json", Bytes::from_static(b"x"), "application/json")
            .await;
        assert!(result.is_err());
        assert!(!tmp.path().join("photos/gallery/manifest.json").exists());
    }

    #[tokio::test]
    async fn rejects_bucket_names_that_leave_the_root() {
        let (_tmp, store) = setup();
        for bucket in ["..", "/tmp", "a/b", ""] {
            let err = store.list(bucket, "").await.unwrap_err();
            assert!(err.to_string().contains("invalid bucket name"), "{bucket:?}: {err}");
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_existing_object() {
        let (tmp, store) = setup();
        let target = tmp.path().join("photos/gallery/manifest.json");
        fs::write(&target, b"previous").unwrap();
        // A directory where the temp file would go makes File::create fail.
        fs::create_dir_all(tmp.path().join("photos/gallery/manifest.json.partial")).unwrap();

        let result = store
            .put("photos", "gallery/manifest.json", Bytes::from_static(b"next"), "application/json")
            .await;
        assert!(result.is_err());
        assert_eq!(fs::read(&target).unwrap(), b"previous");
    }
}
