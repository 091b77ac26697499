//! # Gallery Manifest
//!
//! Keeps a JSON index of the images in an object-storage photo gallery. Each
//! invocation lists the objects under a gallery prefix, keeps the images, and
//! overwrites `<prefix>manifest.json` with a fresh description of them. Static
//! front ends fetch that one file instead of listing the bucket themselves.
//!
//! # Pipeline
//!
//! ```text
//! event ─▶ handler ─▶ generator ─▶ storage.list(bucket, prefix)
//!                         │
//!                         ├─▶ manifest::build_manifest   (pure filter + map)
//!                         │
//!                         └─▶ storage.put(<prefix>manifest.json, application/json)
//!          ◀── {statusCode, body}
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered config: stock defaults → `gallery-manifest.toml` → environment |
//! | [`naming`] | Key conventions: image extensions, final segment, manifest key |
//! | [`manifest`] | `Manifest` / `ImageRecord` and the listing → manifest transform |
//! | [`storage`] | `ObjectStore` trait with S3, local-directory, and in-memory backends |
//! | [`generator`] | One run: list, build, serialize, write |
//! | [`handler`] | Invocation boundary, turns every outcome into a status + body |
//! | [`output`] | CLI text formatting of run results |
//! | [`types`] | Object descriptors shared by backends and the manifest builder |
//!
//! # Design Decisions
//!
//! ## Full Regeneration
//!
//! The manifest is rebuilt from a listing every time, never patched. Two runs
//! over the same bucket differ only in `generated`, so there is no state to
//! drift and a lost or corrupt manifest is repaired by the next invocation.
//!
//! ## All-or-Nothing Writes
//!
//! The manifest is serialized completely before the single write call. Object
//! stores replace objects atomically, and the local backend writes to a
//! temporary file and renames it, so readers see either the old manifest or
//! the new one.
//!
//! ## One Listing Page
//!
//! Exactly one listing request is issued. Galleries larger than a page produce
//! a manifest of the first page and a logged warning.

pub mod config;
pub mod generator;
pub mod handler;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod storage;
pub mod types;

pub use config::GeneratorConfig;
pub use generator::{GenerateError, GenerateSummary, ManifestGenerator};
pub use handler::{InvocationResult, handle};
pub use manifest::{ImageRecord, Manifest};
