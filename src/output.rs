//! CLI output formatting for manifest runs.
//!
//! Output lists what ended up in the manifest, one line per image with its
//! key as indented context, followed by a one-line total:
//!
//! ```text
//! Manifest photos/gallery/manifest.json
//! 001 a.jpg (12.1 KB)
//!     Source: gallery/a.jpg
//!     Modified: 2024-01-01T00:00:00.000Z
//! 002 b.png (1.4 MB)
//!     Source: gallery/2024/b.png
//!     Modified: 2024-01-03T10:00:00.000Z
//!
//! 2 images from 5 listed objects
//! ```
//!
//! `format_*` functions return lines and do no I/O; `print_*` wrappers write
//! them to stdout.

use crate::config::GeneratorConfig;
use crate::generator::GenerateSummary;
use crate::types::iso_millis;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte size with one decimal above 1 KB.
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

pub fn format_summary(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Manifest {}/{}",
        summary.bucket, summary.manifest_key
    )];

    for (i, image) in summary.manifest.images.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            image.name,
            format_size(image.size)
        ));
        lines.push(format!("{}Source: {}", indent(1), image.path));
        lines.push(format!(
            "{}Modified: {}",
            indent(1),
            iso_millis::format(&image.modified)
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "{} from {}",
        plural(summary.image_count, "image", "images"),
        plural(summary.listed, "listed object", "listed objects")
    ));
    if summary.truncated {
        lines.push(format!(
            "{}Warning: listing was truncated, only the first page is included",
            indent(1)
        ));
    }
    lines
}

pub fn print_summary(summary: &GenerateSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

pub fn format_config(config: &GeneratorConfig) -> Vec<String> {
    let mut lines = vec![
        "Config".to_string(),
        format!("{}Region: {}", indent(1), config.region),
        format!("{}Bucket: {}", indent(1), config.bucket),
        format!(
            "{}Prefix: {}",
            indent(1),
            if config.prefix.is_empty() {
                "(none)"
            } else {
                config.prefix.as_str()
            }
        ),
        format!("{}Manifest: {}", indent(1), config.manifest_key()),
    ];
    if config.prefix_lacks_separator() {
        lines.push(format!(
            "{}Warning: prefix has no trailing '/', it is matched as a raw string",
            indent(1)
        ));
    }
    lines
}

pub fn print_config(config: &GeneratorConfig) {
    for line in format_config(config) {
        println!("{}", line);
    }
}
