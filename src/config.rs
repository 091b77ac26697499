//! Generator configuration.
//!
//! Three layers, later layers override earlier ones key by key:
//!
//! ```text
//! stock defaults                 region = "us-east-1", prefix = ""
//! gallery-manifest.toml          optional, next to the binary or via --config
//! environment                    AWS_REGION, BUCKET_NAME, GALLERY_PREFIX
//! ```
//!
//! In a deployed function only the environment is normally set. The file layer
//! exists for local runs against a directory-backed bucket.
//!
//! ## Configuration Options
//!
//! ```toml
//! region = "us-east-1"   # Storage service region
//! bucket = "my-photos"   # Target bucket (required)
//! prefix = "gallery/"    # Key prefix scoping the listing and the manifest
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::naming;

/// Default file name looked up when `--config` is not given.
pub const CONFIG_FILENAME: &str = "gallery-manifest.toml";

/// Region used when neither the file nor the environment names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Environment variable → config key.
pub const ENV_KEYS: &[(&str, &str)] = &[
    ("AWS_REGION", "region"),
    ("BUCKET_NAME", "bucket"),
    ("GALLERY_PREFIX", "prefix"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Resolved generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Storage service region.
    pub region: String,
    /// Bucket listed and written to.
    pub bucket: String,
    /// Raw key prefix. Include the trailing `/` for directory-like scoping.
    pub prefix: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            bucket: String::new(),
            prefix: String::new(),
        }
    }
}

impl GeneratorConfig {
    /// Check required values are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bucket must be set (BUCKET_NAME or `bucket` in the config file)".into(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::Validation("region must not be empty".into()));
        }
        Ok(())
    }

    /// Key the manifest is read from and written to.
    pub fn manifest_key(&self) -> String {
        naming::manifest_key(&self.prefix)
    }

    /// A non-empty prefix without a trailing slash matches keys like
    /// `galleryfoo.jpg` and puts the manifest at `gallerymanifest.json`.
    pub fn prefix_lacks_separator(&self) -> bool {
        !self.prefix.is_empty() && !self.prefix.ends_with('/')
    }
}

// =============================================================================
// Layer loading and merging
// =============================================================================

/// Stock defaults as a TOML table, the base layer for merging.
pub fn stock_defaults_value() -> toml::Value {
    let mut table = toml::map::Map::new();
    let defaults = GeneratorConfig::default();
    table.insert("region".into(), toml::Value::String(defaults.region));
    table.insert("bucket".into(), toml::Value::String(defaults.bucket));
    table.insert("prefix".into(), toml::Value::String(defaults.prefix));
    toml::Value::Table(table)
}

/// Lay `overlay`'s top-level keys over `base`.
///
/// The config is a single flat table, so a layer replaces whole values. A
/// non-table overlay is ignored and left for deserialization to reject.
pub fn overlay_keys(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            base_table.extend(overlay_table);
            toml::Value::Table(base_table)
        }
        (base, _) => base,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Build the environment layer from a variable lookup.
///
/// Only variables that are set produce keys, so unset variables never mask
/// values from the file. An empty `AWS_REGION` counts as unset; empty bucket
/// and prefix values are kept so they can be validated or cleared explicitly.
pub fn env_overlay<F>(lookup: F) -> Option<toml::Value>
where
    F: Fn(&str) -> Option<String>,
{
    let mut table = toml::map::Map::new();
    for (var, key) in ENV_KEYS {
        if let Some(value) = lookup(*var) {
            if *key == "region" && value.is_empty() {
                continue;
            }
            table.insert((*key).to_string(), toml::Value::String(value));
        }
    }
    if table.is_empty() {
        None
    } else {
        Some(toml::Value::Table(table))
    }
}

/// Merge overlays in order onto the stock defaults, then deserialize and validate.
pub fn resolve_config(
    overlays: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<GeneratorConfig, ConfigError> {
    let merged = overlays
        .into_iter()
        .flatten()
        .fold(stock_defaults_value(), overlay_keys);
    let config: GeneratorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from an optional file and the process environment.
pub fn load_config(file: &Path) -> Result<GeneratorConfig, ConfigError> {
    load_config_with(file, |var| std::env::var(var).ok())
}

/// [`load_config`] with an injectable environment, for tests and embedding.
pub fn load_config_with<F>(file: &Path, lookup: F) -> Result<GeneratorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file_layer = load_raw_config(file)?;
    resolve_config([file_layer, env_overlay(lookup)])
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Manifest Configuration
# =============================
# Every key can also be set from the environment, which takes precedence:
#   region -> AWS_REGION
#   bucket -> BUCKET_NAME
#   prefix -> GALLERY_PREFIX
#
# Unknown keys will cause an error.

# Region of the storage service.
region = "us-east-1"

# Bucket that holds the gallery. Required.
bucket = ""

# Key prefix scoping the listing. The manifest is written to
# "<prefix>manifest.json". Include the trailing slash for folder-like prefixes.
prefix = ""
"##
}
