//! Manifest generation: list → filter → serialize → write.
//!
//! One run issues exactly two storage calls in sequence: a listing under the
//! configured prefix and a write of `<prefix>manifest.json`. Nothing is written
//! unless the listing succeeded and the manifest serialized, so a failed run
//! leaves whatever manifest was there before.
//!
//! ## Truncated Listings
//!
//! Only the first page of a listing is read. When the backend says there were
//! more keys, the manifest still covers just the first page and the run logs a
//! warning; [`GenerateSummary::truncated`] carries the flag to callers.

use crate::config::GeneratorConfig;
use crate::manifest::{self, Manifest};
use crate::storage::{ObjectStore, StorageError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Content type stored with the manifest object.
pub const MANIFEST_CONTENT_TYPE: &str = "application/json";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("failed to list {bucket}/{prefix}: {source}")]
    List {
        bucket: String,
        prefix: String,
        #[source]
        source: StorageError,
    },
    #[error("failed to write {bucket}/{key}: {source}")]
    Write {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct GenerateSummary {
    pub bucket: String,
    pub manifest_key: String,
    pub image_count: usize,
    /// Objects returned by the listing, before filtering.
    pub listed: usize,
    pub truncated: bool,
    pub manifest: Manifest,
}

pub struct ManifestGenerator<S> {
    store: S,
    config: GeneratorConfig,
}

impl<S: ObjectStore> ManifestGenerator<S> {
    pub fn new(store: S, config: GeneratorConfig) -> Self {
        if config.prefix_lacks_separator() {
            warn!(
                prefix = %config.prefix,
                manifest_key = %config.manifest_key(),
                "Gallery prefix has no trailing '/'; it matches keys as a raw string prefix"
            );
        }
        Self { store, config }
    }

    /// Generate and write the manifest, stamped with the current time.
    pub async fn run(&self) -> Result<GenerateSummary, GenerateError> {
        self.run_at(Utc::now()).await
    }

    /// Generate and write the manifest with an explicit `generated` timestamp.
    #[instrument(skip(self), fields(bucket = %self.config.bucket, prefix = %self.config.prefix))]
    pub async fn run_at(&self, generated: DateTime<Utc>) -> Result<GenerateSummary, GenerateError> {
        let bucket = &self.config.bucket;
        let prefix = &self.config.prefix;
        let manifest_key = self.config.manifest_key();

        let listing = self
            .store
            .list(bucket, prefix)
            .await
            .map_err(|source| GenerateError::List {
                bucket: bucket.clone(),
                prefix: prefix.clone(),
                source,
            })?;

        if listing.truncated {
            warn!(
                listed = listing.objects.len(),
                "Listing was truncated; manifest covers only the first page of results"
            );
        }

        let manifest = manifest::build_manifest(&listing.objects, &manifest_key, generated);
        let body = manifest.to_json_pretty()?;

        self.store
            .put(bucket, &manifest_key, Bytes::from(body), MANIFEST_CONTENT_TYPE)
            .await
            .map_err(|source| GenerateError::Write {
                bucket: bucket.clone(),
                key: manifest_key.clone(),
                source,
            })?;

        info!(
            manifest_key = %manifest_key,
            listed = listing.objects.len(),
            images = manifest.count,
            "Manifest generated"
        );

        Ok(GenerateSummary {
            bucket: bucket.clone(),
            manifest_key,
            image_count: manifest.count,
            listed: listing.objects.len(),
            truncated: listing.truncated,
            manifest,
        })
    }
}
