//! The gallery manifest: data model and the pure listing → manifest transform.
//!
//! ## Output Format
//!
//! ```json
//! {
//!   "images": [
//!     {
//!       "name": "a.jpg",
//!       "path": "gallery/a.jpg",
//!       "size": 12345,
//!       "modified": "2024-01-01T00:00:00.000Z"
//!     }
//!   ],
//!   "generated": "2024-01-02T00:00:00.000Z",
//!   "count": 1
//! }
//! ```
//!
//! [`build_manifest`] does no I/O and takes the generation timestamp as an
//! argument, so every property of the output can be checked without a bucket.

use crate::naming;
use crate::types::{ObjectInfo, iso_millis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One image in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Final path segment of the key (`a.jpg`).
    pub name: String,
    /// Full object key (`gallery/a.jpg`).
    pub path: String,
    pub size: u64,
    #[serde(with = "iso_millis")]
    pub modified: DateTime<Utc>,
}

impl ImageRecord {
    pub fn from_object(object: &ObjectInfo) -> Self {
        Self {
            name: naming::file_name(&object.key).to_string(),
            path: object.key.clone(),
            size: object.size,
            modified: object.last_modified,
        }
    }
}

/// The document written to `<prefix>manifest.json`.
///
/// Construct through [`Manifest::new`] or [`build_manifest`] so that `count`
/// always equals `images.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub images: Vec<ImageRecord>,
    #[serde(with = "iso_millis")]
    pub generated: DateTime<Utc>,
    pub count: usize,
}

impl Manifest {
    pub fn new(images: Vec<ImageRecord>, generated: DateTime<Utc>) -> Self {
        let count = images.len();
        Self {
            images,
            generated,
            count,
        }
    }

    /// Render as two-space indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// True when both manifests describe the same images, ignoring `generated`.
    pub fn same_images(&self, other: &Manifest) -> bool {
        self.count == other.count && self.images == other.images
    }
}

/// Filter a listing down to images and build the manifest.
///
/// Keeps listing order. Drops the object stored at `manifest_key` and every
/// key without a recognized image extension.
pub fn build_manifest(
    objects: &[ObjectInfo],
    manifest_key: &str,
    generated: DateTime<Utc>,
) -> Manifest {
    let images = objects
        .iter()
        .filter(|o| o.key != manifest_key && naming::is_image_key(&o.key))
        .map(ImageRecord::from_object)
        .collect();
    Manifest::new(images, generated)
}
